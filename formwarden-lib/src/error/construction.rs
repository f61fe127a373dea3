//! Construction error types

/// Errors that can occur while binding a validator to its form.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConstructionError {
    /// The selector did not match any form in the document.
    #[error("No form matches selector '{selector}'")]
    FormNotFound { selector: String },

    /// The target resolved to something that is not a form container.
    #[error("The supplied element is not a valid form")]
    NotAForm,
}

impl ConstructionError {
    /// Creates a new form-not-found error.
    pub fn form_not_found(selector: impl Into<String>) -> Self {
        Self::FormNotFound {
            selector: selector.into(),
        }
    }
}
