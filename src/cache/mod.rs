//! Stale-while-revalidate cache for API responses
//!
//! This module keeps the latest response per resource key in memory with a
//! fixed freshness window, fans writes out to listeners, and serves cached data
//! first while revalidating in the background. A `CacheContext` ties the pieces
//! together and `CachedResource` is what a screen holds on to.

pub mod clock;
pub mod context;
pub mod listeners;
pub mod resource;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{CacheConfig, CacheContext};
pub use listeners::{Listener, ListenerRegistry, Subscription};
pub use resource::{CachedResource, LoadPhase, ResourceOptions, ResourceState};
pub use store::{CacheEntry, TtlStore, FRESHNESS_WINDOW};
