//! Error types

mod construction;
mod rule;
mod settings;
mod submit;

pub use construction::*;
pub use rule::*;
pub use settings::*;
pub use submit::*;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The validator could not be bound to a form.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// The submit helper failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
