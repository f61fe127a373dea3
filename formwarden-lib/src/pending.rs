//! Per-field tracking of in-flight validations.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

/// Proof that a validation run was started, captured when it begins.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    generation: u64,
    token: CancellationToken,
}

impl Ticket {
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Generation counters and cancellation tokens, one slot per field.
///
/// Starting a run cancels the previous token for the field and bumps its
/// generation; a run may only apply its result while its generation is
/// still the newest.
#[derive(Debug, Default)]
pub(crate) struct PendingOps {
    slots: HashMap<String, Slot>,
}

impl PendingOps {
    /// Supersedes whatever is running for `field` and starts a new run.
    pub(crate) fn begin(&mut self, field: &str) -> Ticket {
        let slot = self.slots.entry(field.to_string()).or_default();
        if let Some(previous) = slot.token.take() {
            log::debug!("cancelling in-flight validation of '{field}'");
            previous.cancel();
        }
        slot.generation += 1;
        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        Ticket {
            generation: slot.generation,
            token,
        }
    }

    /// Whether `ticket` still belongs to the newest, uncancelled run.
    pub(crate) fn is_current(&self, field: &str, ticket: &Ticket) -> bool {
        !ticket.token.is_cancelled()
            && self
                .slots
                .get(field)
                .is_some_and(|slot| slot.generation == ticket.generation)
    }

    /// Releases the slot if `ticket` still owns it.
    pub(crate) fn finish(&mut self, field: &str, ticket: &Ticket) {
        if let Some(slot) = self
            .slots
            .get_mut(field)
            .filter(|slot| slot.generation == ticket.generation)
        {
            slot.token = None;
        }
    }

    /// Whether a run is in flight for `field`.
    pub(crate) fn in_flight(&self, field: &str) -> bool {
        self.slots.get(field).is_some_and(|slot| slot.token.is_some())
    }

    /// Cancels every run and invalidates all outstanding tickets.
    pub(crate) fn cancel_all(&mut self) {
        for slot in self.slots.values_mut() {
            if let Some(token) = slot.token.take() {
                token.cancel();
            }
            slot.generation += 1;
        }
    }
}
