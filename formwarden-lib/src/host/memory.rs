//! In-memory form and document implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{FileAttachment, FormDocument, FormHost, SubmitState};

/// A single field of a [`MemoryForm`].
#[derive(Debug, Clone, Default)]
struct MemoryField {
    name: String,
    value: String,
    files: Vec<FileAttachment>,
    /// Message rendered in the field's group, if it is marked as erroneous
    error: Option<String>,
}

#[derive(Debug)]
struct MemoryFormInner {
    fields: Vec<MemoryField>,
    is_form: bool,
    native_validation: bool,
    /// Every state the submit control has been put in, oldest first
    submit_states: Vec<SubmitState>,
}

/// A form held entirely in memory.
///
/// Useful for tests, headless drivers, and embedders that keep their own
/// view. Feedback calls from the validator are recorded so they can be
/// inspected afterwards.
///
/// # Example
///
/// ```
/// use formwarden_lib::host::{FormHost, MemoryForm};
///
/// let form = MemoryForm::new().with_field("email", "");
/// form.set_value("email", "a@b.com");
/// assert_eq!(form.field_value("email").as_deref(), Some("a@b.com"));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryForm {
    inner: Arc<RwLock<MemoryFormInner>>,
}

impl MemoryForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFormInner {
                fields: Vec::new(),
                is_form: true,
                native_validation: true,
                submit_states: Vec::new(),
            })),
        }
    }

    /// Creates a container that is not a form.
    pub fn container() -> Self {
        let form = Self::new();
        form.write().is_form = false;
        form
    }

    /// Adds a field with an initial value.
    pub fn with_field(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.write().fields.push(MemoryField {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        });
        self
    }

    /// Sets a field's value, creating the field if needed.
    pub fn set_value(&self, name: &str, value: impl Into<String>) {
        let mut inner = self.write();
        match inner.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value.into(),
            None => inner.fields.push(MemoryField {
                name: name.to_string(),
                value: value.into(),
                ..Default::default()
            }),
        }
    }

    /// Attaches a file to an existing field.
    pub fn attach_file(&self, name: &str, file: FileAttachment) {
        let mut inner = self.write();
        if let Some(field) = inner.fields.iter_mut().find(|f| f.name == name) {
            field.files.push(file);
        }
    }

    /// Returns the error message shown in a field's group.
    pub fn group_error(&self, name: &str) -> Option<String> {
        self.read()
            .fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.error.clone())
    }

    /// Returns the current submit control state.
    pub fn submit_state(&self) -> SubmitState {
        self.read().submit_states.last().copied().unwrap_or_default()
    }

    /// Returns every submit control state applied so far.
    pub fn submit_history(&self) -> Vec<SubmitState> {
        self.read().submit_states.clone()
    }

    /// Whether the host's own validation UI is enabled.
    pub fn native_validation(&self) -> bool {
        self.read().native_validation
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryFormInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryFormInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryForm {
    fn default() -> Self {
        Self::new()
    }
}

impl FormHost for MemoryForm {
    fn is_form(&self) -> bool {
        self.read().is_form
    }

    fn field_names(&self) -> Vec<String> {
        self.read().fields.iter().map(|f| f.name.clone()).collect()
    }

    fn has_field(&self, name: &str) -> bool {
        self.read().fields.iter().any(|f| f.name == name)
    }

    fn field_value(&self, name: &str) -> Option<String> {
        self.read()
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.clone())
    }

    fn field_files(&self, name: &str) -> Vec<FileAttachment> {
        self.read()
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.files.clone())
            .unwrap_or_default()
    }

    fn set_native_validation(&self, enabled: bool) {
        self.write().native_validation = enabled;
    }

    fn show_field_error(&self, name: &str, message: &str) {
        if let Some(field) = self.write().fields.iter_mut().find(|f| f.name == name) {
            field.error = Some(message.to_string());
        }
    }

    fn clear_field_error(&self, name: &str) {
        if let Some(field) = self.write().fields.iter_mut().find(|f| f.name == name) {
            field.error = None;
        }
    }

    fn set_submit_state(&self, state: SubmitState) {
        self.write().submit_states.push(state);
    }
}

/// A document holding forms keyed by selector.
#[derive(Default)]
pub struct MemoryDocument {
    forms: RwLock<HashMap<String, Arc<dyn FormHost>>>,
}

impl MemoryDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a form under a selector.
    pub fn insert(&self, selector: impl Into<String>, form: Arc<dyn FormHost>) {
        self.forms
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(selector.into(), form);
    }
}

impl FormDocument for MemoryDocument {
    fn query_form(&self, selector: &str) -> Option<Arc<dyn FormHost>> {
        self.forms
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(selector)
            .cloned()
    }
}
