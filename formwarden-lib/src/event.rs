//! Observable validator events.
//!
//! Presentation code subscribes to an [`EventBus`] to react to validity
//! changes without the validator knowing anything about it.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::result::FieldError;

/// Something the validator wants observers to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorEvent {
    /// A field failed validation.
    FieldInvalid { field: String, message: String },
    /// A field passed validation (or was reset).
    FieldValid { field: String },
    /// Whether every field is valid changed.
    FormValidityChanged(bool),
    /// A submit passed forced validation.
    ValidSubmit,
    /// A submit failed forced validation.
    InvalidSubmit { errors: Vec<FieldError> },
}

impl ValidatorEvent {
    /// Short name of the event, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FieldInvalid { .. } => "field-invalid",
            Self::FieldValid { .. } => "field-valid",
            Self::FormValidityChanged(_) => "form-validity-changed",
            Self::ValidSubmit => "valid-submit",
            Self::InvalidSubmit { .. } => "invalid-submit",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&ValidatorEvent) + Send + Sync>;

/// Fan-out of [`ValidatorEvent`]s to registered listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ValidatorEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    /// Delivers an event to every listener.
    ///
    /// A panicking listener is logged and skipped; the remaining listeners
    /// still receive the event.
    pub fn emit(&self, event: ValidatorEvent) {
        // Snapshot so listeners may (un)subscribe while being called
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        log::trace!("emit {} to {} listener(s)", event.name(), listeners.len());
        for listener in listeners {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                log::error!(
                    "Listener for '{}' panicked: {}",
                    event.name(),
                    panic_message(panic.as_ref())
                );
            }
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Text carried by a panic payload, if it is a string.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_reaches_all_listeners() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = Arc::clone(&seen);
        bus.subscribe(move |e| s1.lock().unwrap().push(("first", e.clone())));
        let s2 = Arc::clone(&seen);
        bus.subscribe(move |e| s2.lock().unwrap().push(("second", e.clone())));

        bus.emit(ValidatorEvent::FormValidityChanged(true));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "first");
        assert_eq!(seen[1].1, ValidatorEvent::FormValidityChanged(true));
    }

    #[test]
    fn test_panicking_listener_is_contained() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU64::new(0));

        bus.subscribe(|_| panic!("listener exploded"));
        let c = Arc::clone(&count);
        bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ValidatorEvent::ValidSubmit);
        bus.emit(ValidatorEvent::ValidSubmit);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let id = bus.subscribe(|_| {});
        assert_eq!(bus.len(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.is_empty());
    }

    #[test]
    fn test_panic_message_from_payload() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(42i32);

        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "<non-string panic payload>");
    }
}
