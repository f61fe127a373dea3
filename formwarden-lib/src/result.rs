//! Field state and submit outcome types.

use serde::Serialize;

use crate::host::FormValues;

/// Validity snapshot of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    /// Field name.
    pub field_name: String,
    /// Whether the last applied validation passed.
    pub is_valid: bool,
    /// Message of the failing rule, if any.
    pub message: Option<String>,
}

impl FieldState {
    /// The pessimistic initial state: invalid, no message.
    pub fn untrusted(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            is_valid: false,
            message: None,
        }
    }

    /// A passing state.
    pub fn valid(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            is_valid: true,
            message: None,
        }
    }

    /// A failing state with a message.
    pub fn invalid(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Information about a single field validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name.
    pub field_name: String,
    /// Error message.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field_name, self.message)
    }
}

/// What a submit attempt ended in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Every field passed; carries the serialized values.
    Valid(FormValues),
    /// At least one field failed.
    Invalid(Vec<FieldError>),
    /// Another submit was already in flight.
    #[default]
    Ignored,
}

impl SubmitOutcome {
    /// Check if the submit passed validation.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Check if the submit was dropped as a duplicate.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    /// Get all validation errors.
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => errors,
            _ => &[],
        }
    }

    /// Get the first validation error (if any).
    pub fn first_error(&self) -> Option<&FieldError> {
        self.errors().first()
    }
}
