//! Per-key listener registry
//!
//! Fans cache writes out to every consumer interested in a key without the
//! store knowing anything about who is listening.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked with `(key, data)` after every write to its key
pub type Listener = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Identifies one registration so it can be removed by identity
pub type ListenerId = u64;

/// Listener sets keyed by cache key
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: ListenerId,
    listeners: HashMap<String, Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `key` and returns its id
    pub fn subscribe(&mut self, key: &str, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = self.next_id;
        self.listeners
            .entry(key.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes one registration
    ///
    /// Returns false if it was already gone. An emptied set is deleted.
    pub fn unsubscribe(&mut self, key: &str, id: ListenerId) -> bool {
        let Some(set) = self.listeners.get_mut(key) else {
            return false;
        };
        let before = set.len();
        set.retain(|(listener_id, _)| *listener_id != id);
        let removed = set.len() != before;
        if set.is_empty() {
            self.listeners.remove(key);
        }
        removed
    }

    /// Copies out the callbacks for `key` so they can run without the lock held
    pub fn snapshot(&self, key: &str) -> Vec<Listener> {
        self.listeners
            .get(key)
            .map(|set| set.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Number of listeners registered for `key`
    pub fn listener_count(&self, key: &str) -> usize {
        self.listeners.get(key).map_or(0, Vec::len)
    }

    /// Number of keys with at least one listener
    pub fn key_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Invokes every listener with `(key, data)`
///
/// A panicking listener is logged and skipped; the rest still run.
pub fn notify(listeners: &[Listener], key: &str, data: &Value) {
    for listener in listeners {
        let result = panic::catch_unwind(AssertUnwindSafe(|| listener(key, data)));
        if result.is_err() {
            tracing::error!("Cache listener for '{}' panicked; continuing with the rest", key);
        }
    }
}

/// Handle for one registration
///
/// `unsubscribe` is idempotent. Dropping the handle unsubscribes too, which
/// is how a consumer "unmounts".
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    key: String,
    id: ListenerId,
    registry: Weak<Mutex<ListenerRegistry>>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(key: &str, id: ListenerId, registry: &Arc<Mutex<ListenerRegistry>>) -> Self {
        Self {
            key: key.to_string(),
            id,
            registry: Arc::downgrade(registry),
            active: AtomicBool::new(true),
        }
    }

    /// Removes exactly this listener; later calls do nothing
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().unsubscribe(&self.key, self.id);
        }
    }

    /// The key this subscription listens on
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
