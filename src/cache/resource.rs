//! Cache-bound data consumers
//!
//! A `CachedResource<T>` is what a screen holds for one API resource: it paints
//! from the cache immediately, keeps itself current through listener
//! notifications and optional interval revalidation, and exposes loading and
//! error state for rendering. Dropping it is the equivalent of unmounting.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::context::CacheContext;
use super::listeners::Subscription;
use crate::api::{FetchError, Fetcher};

/// Where a resource is in its load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Waiting for the first answer, or for an explicit refetch
    Loading,
    /// Data is available
    Ready,
    /// The last foreground load failed with no data to show
    Error,
}

/// Observable state of a resource
#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    /// Latest data, `None` before the first load
    pub data: Option<T>,
    pub phase: LoadPhase,
    /// Error from the most recent foreground load
    pub error: Option<FetchError>,
}

impl<T> ResourceState<T> {
    fn loading(data: Option<T>) -> Self {
        Self {
            data,
            phase: LoadPhase::Loading,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }
}

/// Options for mounting a `CachedResource`
#[derive(Clone, Default)]
pub struct ResourceOptions {
    /// Revalidate on mount even when the cache already painted data.
    /// `None` means yes.
    pub background_refresh: Option<bool>,
    /// Period of background revalidation, if any. Zero disables it.
    pub refetch_interval: Option<Duration>,
    /// Fetcher to use instead of the context's default
    pub fetcher: Option<Arc<dyn Fetcher>>,
}

impl ResourceOptions {
    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    pub fn with_background_refresh(mut self, enabled: bool) -> Self {
        self.background_refresh = Some(enabled);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }
}

impl std::fmt::Debug for ResourceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceOptions")
            .field("background_refresh", &self.background_refresh)
            .field("refetch_interval", &self.refetch_interval)
            .field("custom_fetcher", &self.fetcher.is_some())
            .finish()
    }
}

/// A mounted consumer of one cache key
///
/// State transitions: `Loading -> Ready | Error`. `refetch` passes through
/// `Loading` again; background revalidation and listener notifications move
/// straight to `Ready` so existing data never flickers away.
pub struct CachedResource<T> {
    key: String,
    ctx: CacheContext,
    fetcher: Arc<dyn Fetcher>,
    state: Arc<watch::Sender<ResourceState<T>>>,
    subscription: Subscription,
    interval_task: Option<JoinHandle<()>>,
}

impl<T> CachedResource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Mounts a consumer for `key`
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(ctx: CacheContext, key: &str, options: ResourceOptions) -> Self {
        let fetcher = options.fetcher.clone().unwrap_or_else(|| ctx.fetcher());

        // Instant paint; `get` drops an expired entry so it is never shown
        let initial = ctx.get_cached_data(key).and_then(|value| decode::<T>(key, value).ok());
        let painted = initial.is_some();
        let initial_state = match initial {
            Some(data) => ResourceState {
                data: Some(data),
                phase: LoadPhase::Ready,
                error: None,
            },
            None => ResourceState::loading(None),
        };
        let (tx, _rx) = watch::channel(initial_state);
        let state = Arc::new(tx);

        let listener_state = Arc::clone(&state);
        let subscription = ctx.subscribe(key, move |key, value| {
            match decode::<T>(key, value.clone()) {
                Ok(data) => apply_data(&listener_state, data),
                Err(err) => apply_error(&listener_state, err),
            }
        });

        if !painted || options.background_refresh.unwrap_or(true) {
            let ctx = ctx.clone();
            let key = key.to_string();
            let fetcher = Arc::clone(&fetcher);
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let _ = load(&ctx, &key, fetcher, false, &state).await;
            });
        }

        // tokio intervals reject a zero period; treat it as "no interval"
        let refetch_interval = options.refetch_interval.filter(|period| !period.is_zero());
        let interval_task = refetch_interval.map(|period| {
            let ctx = ctx.clone();
            let key = key.to_string();
            let fetcher = Arc::clone(&fetcher);
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // Skip the first tick (immediate); mount already loaded
                interval.tick().await;
                loop {
                    interval.tick().await;
                    revalidate(&ctx, &key, Arc::clone(&fetcher), &state).await;
                }
            })
        });

        Self {
            key: key.to_string(),
            ctx,
            fetcher,
            state,
            subscription,
            interval_task,
        }
    }

    /// Forces a network round-trip, showing `Loading` until it settles
    pub async fn refetch(&self) -> Result<T, FetchError> {
        self.state.send_modify(|state| state.phase = LoadPhase::Loading);
        load(&self.ctx, &self.key, Arc::clone(&self.fetcher), true, &self.state).await
    }
}

impl<T: Clone> CachedResource<T> {
    /// The key this resource is bound to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Latest data, if any has loaded
    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Error from the most recent foreground load
    pub fn error(&self) -> Option<FetchError> {
        self.state.borrow().error.clone()
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.borrow().phase
    }

    /// Whether the cache considers this key stale
    pub fn is_stale(&self) -> bool {
        self.ctx.is_stale(&self.key)
    }

    /// Copy of the full state
    pub fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn watch(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    /// Waits until the state satisfies `predicate` and returns it
    pub async fn wait_for<F>(&self, mut predicate: F) -> ResourceState<T>
    where
        F: FnMut(&ResourceState<T>) -> bool,
    {
        let mut rx = self.state.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if predicate(&*state) {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }

    /// Whether this resource is still listening for cache writes
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }
}

impl<T> Drop for CachedResource<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        if let Some(task) = self.interval_task.take() {
            task.abort();
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!("Payload for '{}' has an unexpected shape: {}", key, e);
        FetchError::from(e)
    })
}

fn apply_data<T>(state: &watch::Sender<ResourceState<T>>, data: T) {
    state.send_modify(|state| {
        state.data = Some(data);
        state.phase = LoadPhase::Ready;
        state.error = None;
    });
}

fn apply_error<T>(state: &watch::Sender<ResourceState<T>>, error: FetchError) {
    state.send_modify(|state| {
        state.phase = if state.data.is_some() {
            LoadPhase::Ready
        } else {
            LoadPhase::Error
        };
        state.error = Some(error);
    });
}

async fn load<T: DeserializeOwned>(
    ctx: &CacheContext,
    key: &str,
    fetcher: Arc<dyn Fetcher>,
    force_refresh: bool,
    state: &watch::Sender<ResourceState<T>>,
) -> Result<T, FetchError>
where
    T: Clone,
{
    let result = ctx
        .fetch_resource_with(key, fetcher, force_refresh)
        .await
        .and_then(|value| decode::<T>(key, value));
    match &result {
        Ok(data) => apply_data(state, data.clone()),
        Err(err) => apply_error(state, err.clone()),
    }
    result
}

async fn revalidate<T: DeserializeOwned>(
    ctx: &CacheContext,
    key: &str,
    fetcher: Arc<dyn Fetcher>,
    state: &watch::Sender<ResourceState<T>>,
) {
    let result = ctx
        .fetch_resource_with(key, fetcher, false)
        .await
        .and_then(|value| decode::<T>(key, value));
    match result {
        Ok(data) => apply_data(state, data),
        Err(err) => {
            tracing::warn!("Interval refresh for '{}' failed: {}", key, err);
            // Keep showing whatever is on screen; only record when there is nothing
            let has_data = state.borrow().data.is_some();
            if !has_data {
                apply_error(state, err);
            }
        }
    }
}
