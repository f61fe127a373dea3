//! Form validation orchestrator
//!
//! Binds to one form, evaluates per-field rules (sync or async) with
//! debouncing, cancellation of stale runs, a short-lived result cache and
//! inter-field dependencies, and gates the form's submit control.

pub mod cache;
pub mod error;
pub mod event;
pub mod graph;
pub mod host;
pub mod options;
pub mod result;
pub mod rules;
pub mod submit;

mod debounce;
mod listener;
mod pending;
mod validator;

pub use error::Error;
pub use event::{SubscriptionId, ValidatorEvent};
pub use listener::FormEvent;
pub use options::{ValidatorOptions, ValidatorSettings};
pub use result::{FieldError, FieldState, SubmitOutcome};
pub use validator::FormValidator;
