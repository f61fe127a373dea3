//! Host events and the listener table built by `init`.

use std::collections::HashSet;

/// Something that happened in the bound form.
///
/// Hosts forward these to [`FormValidator::dispatch`](crate::FormValidator::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A field's value changed.
    Input(String),
    /// A field lost focus.
    Blur(String),
    /// The user asked to submit the form.
    Submit,
}

impl FormEvent {
    /// Creates an input event.
    pub fn input(field: impl Into<String>) -> Self {
        Self::Input(field.into())
    }

    /// Creates a blur event.
    pub fn blur(field: impl Into<String>) -> Self {
        Self::Blur(field.into())
    }
}

/// Which events the validator currently reacts to.
#[derive(Debug, Default)]
pub(crate) struct Listeners {
    /// Fields with rules of their own
    pub(crate) fields: HashSet<String>,
    /// Source fields whose changes revalidate their dependents
    pub(crate) dependency_sources: HashSet<String>,
    pub(crate) submit: bool,
}

impl Listeners {
    pub(crate) fn is_attached(&self) -> bool {
        self.submit || !self.fields.is_empty()
    }

    pub(crate) fn listens_to(&self, field: &str) -> bool {
        self.fields.contains(field) || self.dependency_sources.contains(field)
    }

    pub(crate) fn propagates(&self, field: &str) -> bool {
        self.dependency_sources.contains(field)
    }
}
