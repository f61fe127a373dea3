//! Context handed to every rule evaluation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::host::{FileAttachment, FormHost, FormValues};

/// Everything a rule can look at while validating a value.
#[derive(Clone)]
pub struct RuleContext {
    field: String,
    value: String,
    files: Vec<FileAttachment>,
    fields: FormValues,
    cancel: CancellationToken,
    form: Arc<dyn FormHost>,
}

impl RuleContext {
    pub(crate) fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        form: Arc<dyn FormHost>,
        cancel: CancellationToken,
    ) -> Self {
        let field = field.into();
        Self {
            files: form.field_files(&field),
            fields: form.values(),
            value: value.into(),
            field,
            cancel,
            form,
        }
    }

    /// Name of the field being validated.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The value being validated.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Files attached to the field.
    pub fn files(&self) -> &[FileAttachment] {
        &self.files
    }

    /// Snapshot of every field in the form, taken when validation started.
    pub fn fields(&self) -> &FormValues {
        &self.fields
    }

    /// Fires when this validation run has been superseded.
    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns `true` once this validation run has been superseded.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The form being validated.
    pub fn form(&self) -> &Arc<dyn FormHost> {
        &self.form
    }
}

impl std::fmt::Debug for RuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleContext")
            .field("field", &self.field)
            .field("value", &self.value)
            .field("files", &self.files.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
