//! Short-lived cache of validation results.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// A remembered validation outcome for one `(field, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Whether the value passed every rule.
    pub is_valid: bool,
    /// Message of the failing rule, if any.
    pub message: Option<String>,
    /// When the outcome was recorded.
    pub timestamp: Instant,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn now(is_valid: bool, message: Option<String>) -> Self {
        Self {
            is_valid,
            message,
            timestamp: Instant::now(),
        }
    }

    /// Returns `true` if this entry is younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.timestamp.elapsed() < ttl
    }
}

/// Validation results keyed by field name and raw value.
///
/// Stale entries are never returned but are not evicted either; the next
/// write for the same key replaces them.
#[derive(Debug)]
pub struct ValidationCache {
    store: DashMap<(String, String), CacheEntry>,
    ttl: Duration,
}

impl ValidationCache {
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the fresh entry for `(field, value)`, if any.
    pub fn get(&self, field: &str, value: &str) -> Option<CacheEntry> {
        let entry = self.store.get(&(field.to_string(), value.to_string()))?;
        entry.is_fresh(self.ttl).then(|| entry.value().clone())
    }

    /// Records an outcome for `(field, value)`.
    pub fn set(&self, field: &str, value: &str, is_valid: bool, message: Option<String>) {
        self.store.insert(
            (field.to_string(), value.to_string()),
            CacheEntry::now(is_valid, message),
        );
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = ValidationCache::new(Duration::from_secs(30));
        cache.set("email", "a@b.com", true, None);

        tokio::time::advance(Duration::from_secs(29)).await;
        let entry = cache.get("email", "a@b.com").unwrap();
        assert!(entry.is_valid);
        assert!(cache.get("email", "other").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_ignored_not_evicted() {
        let cache = ValidationCache::new(Duration::from_secs(30));
        cache.set("email", "nope", false, Some("invalid email".into()));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.get("email", "nope").is_none());
        assert_eq!(cache.len(), 1);

        cache.set("email", "nope", false, Some("still invalid".into()));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get("email", "nope").unwrap().message.as_deref(),
            Some("still invalid")
        );
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let cache = ValidationCache::new(Duration::ZERO);
        cache.set("name", "x", true, None);
        assert!(cache.get("name", "x").is_none());
    }
}
