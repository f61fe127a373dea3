//! Rule evaluation error types

/// Non-boolean outcomes a rule can report.
///
/// A rule that simply returns `false` fails with its configured message.
/// Returning one of these lets a rule distinguish a deliberate validation
/// failure from a cancelled or broken check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// The value failed validation.
    ///
    /// Carries an optional message that replaces the rule's own message.
    #[error("Validation failed{}", .0.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Invalid(Option<String>),

    /// The check observed its cancellation signal and stopped early.
    #[error("Validation cancelled")]
    Cancelled,

    /// The check itself failed (network error, bug, etc.).
    #[error("Unexpected rule error: {0}")]
    Unexpected(String),
}

impl RuleError {
    /// Creates a validation failure that keeps the rule's message.
    pub fn invalid() -> Self {
        Self::Invalid(None)
    }

    /// Creates a validation failure with its own message.
    pub fn invalid_with(message: impl Into<String>) -> Self {
        Self::Invalid(Some(message.into()))
    }

    /// Creates an unexpected error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Returns `true` if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
