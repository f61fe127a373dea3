//! Validation rules.
//!
//! A [`Rule`] wraps a predicate over a field's raw value together with the
//! message shown when it fails. Predicates may be synchronous or async; both
//! are stored behind the same boxed-future signature so the validator awaits
//! them uniformly.
//!
//! # Example
//!
//! ```ignore
//! use formwarden_lib::rules::{Rule, RuleSet};
//!
//! let rules = RuleSet::builder()
//!     .field("email")
//!         .required("Email is required")
//!         .email("Please enter a valid email")
//!     .field("username")
//!         .check_async(|v, _cx| async move { !is_taken(&v).await }, "Username taken")
//!     .field("confirm")
//!         .equals_field("password", "Passwords do not match")
//!     .build();
//! ```

mod builtin;
mod context;
mod set;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use context::RuleContext;
pub use set::{FieldBuilder, RuleSet, RuleSetBuilder};

use crate::error::RuleError;

/// Type alias for boxed futures used in async validation.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of evaluating one rule.
pub type RuleResult = Result<bool, RuleError>;

type ValidateFn = dyn Fn(String, RuleContext) -> BoxFuture<'static, RuleResult> + Send + Sync;

/// A single validation rule for a field.
#[derive(Clone)]
pub struct Rule {
    validate: Arc<ValidateFn>,
    message: String,
    depends_on: Vec<String>,
}

impl Rule {
    /// Creates a synchronous rule.
    pub fn new<F>(f: F, message: impl Into<String>) -> Self
    where
        F: Fn(&str, &RuleContext) -> bool + Send + Sync + 'static,
    {
        Self::try_new(move |v, cx| Ok(f(v, cx)), message)
    }

    /// Creates a synchronous rule that can report a [`RuleError`].
    pub fn try_new<F>(f: F, message: impl Into<String>) -> Self
    where
        F: Fn(&str, &RuleContext) -> RuleResult + Send + Sync + 'static,
    {
        Self::from_fn(
            move |value, cx| {
                let result = f(&value, &cx);
                let fut: BoxFuture<'static, RuleResult> = Box::pin(std::future::ready(result));
                fut
            },
            message,
        )
    }

    /// Creates an asynchronous rule.
    pub fn new_async<F, Fut>(f: F, message: impl Into<String>) -> Self
    where
        F: Fn(String, RuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::try_async(
            move |value, cx| {
                let fut = f(value, cx);
                async move { Ok(fut.await) }
            },
            message,
        )
    }

    /// Creates an asynchronous rule that can report a [`RuleError`].
    ///
    /// Long-running checks should watch [`RuleContext::cancel`] and return
    /// [`RuleError::Cancelled`] once it fires.
    pub fn try_async<F, Fut>(f: F, message: impl Into<String>) -> Self
    where
        F: Fn(String, RuleContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RuleResult> + Send + 'static,
    {
        Self::from_fn(
            move |value, cx| {
                let fut: BoxFuture<'static, RuleResult> = Box::pin(f(value, cx));
                fut
            },
            message,
        )
    }

    fn from_fn<F>(f: F, message: impl Into<String>) -> Self
    where
        F: Fn(String, RuleContext) -> BoxFuture<'static, RuleResult> + Send + Sync + 'static,
    {
        Self {
            validate: Arc::new(f),
            message: message.into(),
            depends_on: Vec::new(),
        }
    }

    /// Declares fields that must be valid before this rule applies.
    ///
    /// While any of them is invalid the rule is skipped rather than failed.
    pub fn depends_on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.depends_on.contains(&field) {
                self.depends_on.push(field);
            }
        }
        self
    }

    /// The message reported when this rule fails.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Fields this rule depends on.
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub(crate) fn evaluate(&self, value: String, cx: RuleContext) -> BoxFuture<'static, RuleResult> {
        (self.validate)(value, cx)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("message", &self.message)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}
