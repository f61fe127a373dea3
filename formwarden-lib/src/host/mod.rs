//! Host contract for the form being validated.
//!
//! The validator never touches a real UI. It reads field values through
//! [`FormHost`] and reports feedback back through the same trait, so any
//! front end (a terminal form, a web bridge, a test double) can be bound.

mod memory;
mod values;

use std::sync::Arc;

pub use memory::{MemoryDocument, MemoryForm};
pub use values::{FileAttachment, FormValues};

/// Visual state of the form's submit control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitState {
    /// The form is valid and can be submitted.
    Enabled,
    /// At least one field is invalid.
    #[default]
    Disabled,
    /// A submit is in progress.
    Loading,
}

/// A form-like container exposing named fields.
///
/// Presentation hooks have no-op defaults so data-only hosts only need to
/// implement the field accessors.
pub trait FormHost: Send + Sync {
    /// Whether this container is really a form.
    fn is_form(&self) -> bool {
        true
    }

    /// Names of all fields in the form, in document order.
    fn field_names(&self) -> Vec<String>;

    /// Whether a field with this name exists.
    fn has_field(&self, name: &str) -> bool {
        self.field_names().iter().any(|n| n == name)
    }

    /// Current raw value of a field.
    fn field_value(&self, name: &str) -> Option<String>;

    /// Files attached to a field (empty for non-file inputs).
    fn field_files(&self, _name: &str) -> Vec<FileAttachment> {
        Vec::new()
    }

    /// Turns the host's own validation UI on or off.
    fn set_native_validation(&self, _enabled: bool) {}

    /// Marks the field's group as erroneous and shows `message` beside it.
    fn show_field_error(&self, _name: &str, _message: &str) {}

    /// Removes the error marker and message from the field's group.
    fn clear_field_error(&self, _name: &str) {}

    /// Updates the submit control.
    fn set_submit_state(&self, _state: SubmitState) {}

    /// Serializes every field's current value and attachments.
    fn values(&self) -> FormValues {
        let mut values = FormValues::new();
        for name in self.field_names() {
            let value = self.field_value(&name).unwrap_or_default();
            values.insert(name.clone(), value);
            for file in self.field_files(&name) {
                values.attach(name.clone(), file);
            }
        }
        values
    }
}

/// A document that can look up forms by selector.
pub trait FormDocument: Send + Sync {
    /// Returns the form matching `selector`, if any.
    fn query_form(&self, selector: &str) -> Option<Arc<dyn FormHost>>;
}

/// What a validator should bind to.
#[derive(Clone)]
pub enum FormTarget {
    /// An already resolved form.
    Host(Arc<dyn FormHost>),
    /// A form to look up in a document.
    Selector {
        document: Arc<dyn FormDocument>,
        selector: String,
    },
}

impl FormTarget {
    /// Creates a target resolved through `document`.
    pub fn selector(document: Arc<dyn FormDocument>, selector: impl Into<String>) -> Self {
        Self::Selector {
            document,
            selector: selector.into(),
        }
    }
}

impl<H: FormHost + 'static> From<Arc<H>> for FormTarget {
    fn from(host: Arc<H>) -> Self {
        Self::Host(host)
    }
}

impl std::fmt::Debug for FormTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(_) => f.write_str("FormTarget::Host(..)"),
            Self::Selector { selector, .. } => f
                .debug_struct("FormTarget::Selector")
                .field("selector", selector)
                .finish_non_exhaustive(),
        }
    }
}
