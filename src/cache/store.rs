//! In-memory TTL store for API responses
//!
//! Provides a `TtlStore` that keeps the most recent payload per key together
//! with the time it was written. Freshness is judged against one global window;
//! `get` lazily evicts entries that have outlived it.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;

/// How long an entry is considered fresh after it was written
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(120);

/// A cached response body for one key
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The cache key, conventionally the resource path
    pub key: String,
    /// The cached payload
    pub data: Value,
    /// When the entry was last written
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    /// Age of the entry at `now`
    pub fn age(&self, now: DateTime<Utc>) -> ChronoDuration {
        now - self.timestamp
    }

    /// Whether the entry is older than `window` at `now`
    pub fn is_stale_at(&self, now: DateTime<Utc>, window: ChronoDuration) -> bool {
        self.age(now) > window
    }
}

/// Key to entry map with a fixed freshness window
///
/// Writes are last-write-wins. There is no per-key TTL override.
#[derive(Debug)]
pub struct TtlStore {
    entries: HashMap<String, CacheEntry>,
    window: ChronoDuration,
    clock: Arc<dyn Clock>,
}

impl TtlStore {
    /// Creates an empty store with the given freshness window
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            window: ChronoDuration::milliseconds(window.as_millis() as i64),
            clock,
        }
    }

    /// Overwrites the entry for `key` stamped with the current time
    pub fn set(&mut self, key: &str, data: Value) {
        let entry = CacheEntry {
            key: key.to_string(),
            data,
            timestamp: self.clock.now(),
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Reads the payload for `key`
    ///
    /// An entry older than the freshness window is removed and `None` is
    /// returned, so a second `get` also misses.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let stale = self.entries.get(key)?.is_stale_at(now, self.window);
        if stale {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Reads the entry for `key` without evicting it, however old it is
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// True if there is no entry for `key` or it has outlived the window
    pub fn is_stale(&self, key: &str) -> bool {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) => entry.is_stale_at(now, self.window),
            None => true,
        }
    }

    /// Removes entries and returns how many were dropped
    ///
    /// With `None` every entry goes. With a pattern, every key containing it
    /// as a plain substring is removed.
    pub fn clear(&mut self, pattern: Option<&str>) -> usize {
        let before = self.entries.len();
        match pattern {
            None => self.entries.clear(),
            Some(pattern) => self.entries.retain(|key, _| !key.contains(pattern)),
        }
        before - self.entries.len()
    }

    /// Removes every entry older than the freshness window
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now();
        let window = self.window;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_stale_at(now, window));
        before - self.entries.len()
    }

    /// Number of entries currently held, stale or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently held, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use serde_json::json;

    fn create_test_store() -> (TtlStore, ManualClock) {
        let clock = ManualClock::default();
        let store = TtlStore::new(FRESHNESS_WINDOW, Arc::new(clock.clone()));
        (store, clock)
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (mut store, _clock) = create_test_store();
        assert!(store.get("/api/properties").is_none());
    }

    #[test]
    fn test_set_then_get_returns_data() {
        let (mut store, _clock) = create_test_store();
        store.set("/api/properties", json!([{"id": 1}]));

        assert_eq!(store.get("/api/properties"), Some(json!([{"id": 1}])));
        assert!(!store.is_stale("/api/properties"));
    }

    #[test]
    fn test_overwrite_keeps_latest_data_and_timestamp() {
        let (mut store, clock) = create_test_store();
        store.set("/api/bookings", json!({"v": 1}));
        clock.advance(Duration::from_secs(100));
        store.set("/api/bookings", json!({"v": 2}));
        clock.advance(Duration::from_secs(100));

        // 200s after the first write but only 100s after the second
        assert_eq!(store.get("/api/bookings"), Some(json!({"v": 2})));
    }

    #[test]
    fn test_is_stale_boundary() {
        let (mut store, clock) = create_test_store();
        store.set("k", json!(1));

        clock.advance(Duration::from_secs(120));
        assert!(!store.is_stale("k"), "exactly at the window is still fresh");

        clock.advance(Duration::from_millis(1));
        assert!(store.is_stale("k"));
    }

    #[test]
    fn test_is_stale_for_missing_key() {
        let (store, _clock) = create_test_store();
        assert!(store.is_stale("nothing"));
    }

    #[test]
    fn test_is_stale_does_not_evict() {
        let (mut store, clock) = create_test_store();
        store.set("k", json!("v"));
        clock.advance(Duration::from_secs(121));

        assert!(store.is_stale("k"));
        assert!(store.peek("k").is_some(), "is_stale must not mutate");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_evicts_expired_entry() {
        let (mut store, clock) = create_test_store();
        store.set("k", json!("v"));
        clock.advance(Duration::from_secs(121));

        assert!(store.get("k").is_none());
        assert!(store.get("k").is_none());
        assert!(store.peek("k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_all() {
        let (mut store, _clock) = create_test_store();
        store.set("/api/properties", json!([]));
        store.set("/api/bookings", json!([]));

        assert_eq!(store.clear(None), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_by_substring_pattern() {
        let (mut store, _clock) = create_test_store();
        store.set("/api/properties", json!([]));
        store.set("/api/bookings", json!([]));
        store.set("/api/properties/5", json!({}));

        assert_eq!(store.clear(Some("properties")), 2);

        assert!(store.peek("/api/properties").is_none());
        assert!(store.peek("/api/properties/5").is_none());
        assert!(store.peek("/api/bookings").is_some());
    }

    #[test]
    fn test_clear_pattern_is_not_a_regex() {
        let (mut store, _clock) = create_test_store();
        store.set("/api/tasks", json!([]));

        assert_eq!(store.clear(Some("/api/.*")), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sweep_expired_keeps_fresh_entries() {
        let (mut store, clock) = create_test_store();
        store.set("old", json!(1));
        clock.advance(Duration::from_secs(100));
        store.set("new", json!(2));
        clock.advance(Duration::from_secs(30));

        assert_eq!(store.sweep_expired(), 1);
        let keys = store.keys();
        assert_eq!(keys, vec!["new".to_string()]);
    }

    #[test]
    fn test_cache_entry_age() {
        let (mut store, clock) = create_test_store();
        store.set("k", json!(null));
        clock.advance(Duration::from_secs(5));

        let entry = store.peek("k").expect("entry should exist");
        assert_eq!(entry.age(clock.now()), ChronoDuration::seconds(5));
        assert_eq!(entry.key, "k");
    }
}
