//! Shared cache context and cache-aware fetch
//!
//! `CacheContext` owns the TTL store and listener registry for the lifetime of
//! the application and is handed to every consumer by clone. Its
//! `fetch_resource` implements stale-while-revalidate on top of a `Fetcher`.

use parking_lot::{Mutex, ReentrantMutex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::listeners::{self, ListenerRegistry, Subscription};
use super::resource::{CachedResource, ResourceOptions};
use super::store::{TtlStore, FRESHNESS_WINDOW};
use crate::api::{FetchError, Fetcher};

/// Tunables for a `CacheContext`
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long entries stay fresh after a write
    pub freshness_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: FRESHNESS_WINDOW,
        }
    }
}

struct Inner {
    /// Held across a store write and its notifications so listeners see
    /// writes to a key in the order the store applied them. Reentrant so a
    /// listener may write back into the cache.
    write_order: ReentrantMutex<()>,
    store: Mutex<TtlStore>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    fetcher: Arc<dyn Fetcher>,
}

/// Handle to the process-wide cache
///
/// Clones share one store and one listener registry. Build one at startup and
/// pass it down; tests build a fresh one each.
#[derive(Clone)]
pub struct CacheContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CacheContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheContext")
            .field("entries", &self.inner.store.lock().len())
            .field("listened_keys", &self.inner.listeners.lock().key_count())
            .finish()
    }
}

impl CacheContext {
    /// Creates a context with the default window and the wall clock
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_config(CacheConfig::default(), fetcher, Arc::new(SystemClock))
    }

    /// Creates a context with explicit configuration and time source
    pub fn with_config(config: CacheConfig, fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                write_order: ReentrantMutex::new(()),
                store: Mutex::new(TtlStore::new(config.freshness_window, clock)),
                listeners: Arc::new(Mutex::new(ListenerRegistry::new())),
                fetcher,
            }),
        }
    }

    /// The fetcher used when a call does not supply its own
    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        Arc::clone(&self.inner.fetcher)
    }

    /// Reads a cached payload, evicting it if it has outlived the window
    pub fn get_cached_data(&self, key: &str) -> Option<Value> {
        self.inner.store.lock().get(key)
    }

    /// Reads and decodes a cached payload
    ///
    /// A payload that does not decode as `T` is treated as a miss.
    pub fn get_cached_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_cached_data(key)?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Cached data for '{}' has an unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Writes a payload and notifies every listener on `key`
    ///
    /// Concurrent writers are serialized through notification, so the last
    /// value a listener receives is the value the store holds.
    pub fn set_cached_data(&self, key: &str, data: Value) {
        let _ordered = self.inner.write_order.lock();
        self.inner.store.lock().set(key, data.clone());
        let snapshot = self.inner.listeners.lock().snapshot(key);
        listeners::notify(&snapshot, key, &data);
    }

    /// Encodes and writes a typed payload
    pub fn set_cached<T: Serialize>(&self, key: &str, data: &T) -> Result<(), FetchError> {
        let value = serde_json::to_value(data)?;
        self.set_cached_data(key, value);
        Ok(())
    }

    /// True if `key` has no entry or its entry has outlived the window
    pub fn is_stale(&self, key: &str) -> bool {
        self.inner.store.lock().is_stale(key)
    }

    /// Clears everything, or every key containing `pattern`
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.inner.store.lock().clear(pattern);
        tracing::debug!("Cleared {} cache entries (pattern: {:?})", removed, pattern);
        removed
    }

    /// Drops every entry that has outlived the window
    pub fn sweep_expired(&self) -> usize {
        self.inner.store.lock().sweep_expired()
    }

    /// Number of entries held, stale or not
    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    /// Number of listeners currently registered on `key`
    pub fn listener_count(&self, key: &str) -> usize {
        self.inner.listeners.lock().listener_count(key)
    }

    /// Registers `listener` to run after every write to `key`
    pub fn subscribe<F>(&self, key: &str, listener: F) -> Subscription
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let id = self.inner.listeners.lock().subscribe(key, Arc::new(listener));
        Subscription::new(key, id, &self.inner.listeners)
    }

    /// Forces a network round-trip for `key`
    pub async fn refresh_data(&self, key: &str) -> Result<Value, FetchError> {
        self.fetch_resource(key, true).await
    }

    /// Returns the best available answer for `key` using the default fetcher
    pub async fn fetch_resource(&self, key: &str, force_refresh: bool) -> Result<Value, FetchError> {
        let fetcher = self.fetcher();
        self.fetch_resource_with(key, fetcher, force_refresh).await
    }

    /// Returns the best available answer for `key`
    ///
    /// Unless forced, a cached value is returned at once; if it is stale a
    /// background fetch is spawned to replace it. Otherwise the network is
    /// awaited. When the network fails and any cached value exists, however
    /// old, that value is returned and the failure is only logged.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn fetch_resource_with(
        &self,
        key: &str,
        fetcher: Arc<dyn Fetcher>,
        force_refresh: bool,
    ) -> Result<Value, FetchError> {
        if !force_refresh {
            let cached = self.cached_with_staleness(key);
            if let Some((data, stale)) = cached {
                if stale {
                    self.spawn_revalidation(key, fetcher);
                }
                return Ok(data);
            }
        }

        match fetcher.fetch(key).await {
            Ok(data) => {
                self.set_cached_data(key, data.clone());
                Ok(data)
            }
            Err(err) => {
                let fallback = self.inner.store.lock().peek(key).map(|entry| entry.data.clone());
                match fallback {
                    Some(data) => {
                        tracing::warn!("Fetch for '{}' failed, serving cached data: {}", key, err);
                        Ok(data)
                    }
                    None => Err(err),
                }
            }
        }
    }

    fn cached_with_staleness(&self, key: &str) -> Option<(Value, bool)> {
        let store = self.inner.store.lock();
        let data = store.peek(key)?.data.clone();
        Some((data, store.is_stale(key)))
    }

    fn spawn_revalidation(&self, key: &str, fetcher: Arc<dyn Fetcher>) {
        let ctx = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            match fetcher.fetch(&key).await {
                Ok(data) => ctx.set_cached_data(&key, data),
                Err(e) => tracing::warn!("Background refresh for '{}' failed: {}", key, e),
            }
        });
    }

    /// Mounts a consumer for `key`; see `CachedResource`
    ///
    /// Must be called from within a tokio runtime.
    pub fn use_cached_data<T>(&self, key: &str, options: ResourceOptions) -> CachedResource<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        CachedResource::mount(self.clone(), key, options)
    }
}
