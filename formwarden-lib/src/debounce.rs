//! Per-field debounce timers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Timer {
    seq: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Timers {
    next_seq: u64,
    by_field: HashMap<String, Timer>,
}

/// Coalesces bursts of work per field.
///
/// Scheduling work for a field aborts that field's previous timer if it has
/// not fired yet. Once a timer fires its work is detached from the
/// debouncer and can only be stopped through the validator's own
/// cancellation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Debouncer {
    timers: Arc<Mutex<Timers>>,
}

impl Debouncer {
    /// Runs `work` after `delay` unless rescheduled or cancelled first.
    pub(crate) fn schedule<F>(&self, field: &str, delay: Duration, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            log::error!("cannot debounce '{field}': no tokio runtime");
            return;
        };

        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.next_seq += 1;
        let seq = timers.next_seq;

        let shared = Arc::clone(&self.timers);
        let key = field.to_string();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timers = shared.lock().unwrap_or_else(|e| e.into_inner());
                if timers.by_field.get(&key).is_some_and(|t| t.seq == seq) {
                    timers.by_field.remove(&key);
                }
            }
            work.await;
        });

        if let Some(previous) = timers.by_field.insert(field.to_string(), Timer { seq, handle }) {
            log::trace!("restarting debounce timer for '{field}'");
            previous.handle.abort();
        }
    }

    /// Whether a timer for `field` has not fired yet.
    pub(crate) fn is_pending(&self, field: &str) -> bool {
        self.timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .by_field
            .contains_key(field)
    }

    /// Aborts the timer for `field` if it has not fired yet.
    pub(crate) fn cancel(&self, field: &str) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = timers.by_field.remove(field) {
            timer.handle.abort();
        }
    }

    /// Aborts every timer that has not fired yet.
    pub(crate) fn cancel_all(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        for (_, timer) in timers.by_field.drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces() {
        let debouncer = Debouncer::default();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let runs = Arc::clone(&runs);
            debouncer.schedule("name", Duration::from_millis(500), async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending("name"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending("name"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_drops_timers() {
        let debouncer = Debouncer::default();
        let runs = Arc::new(AtomicUsize::new(0));

        let r = Arc::clone(&runs);
        debouncer.schedule("a", Duration::from_millis(50), async move {
            r.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel_all();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
