//! Background cache maintenance
//!
//! Reads already evict expired entries lazily; this periodic sweep bounds
//! memory for keys that are written once and never read again.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::cache::CacheContext;

/// Configuration for the background sweep
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// How often expired entries are swept
    pub sweep_interval: Duration,
    /// Whether the sweep runs at all
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

/// Handle for controlling the background sweep
pub struct RefreshHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the sweep task for `ctx`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(ctx: CacheContext, config: RefreshConfig) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            let sweep_interval = config.sweep_interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(sweep_interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let removed = ctx.sweep_expired();
                            if removed > 0 {
                                tracing::debug!("Swept {} expired cache entries", removed);
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self { shutdown_tx }
    }

    /// Stops the sweep task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fetch_fn;
    use crate::cache::{CacheConfig, ManualClock};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_context() -> (CacheContext, ManualClock) {
        let clock = ManualClock::default();
        let ctx = CacheContext::with_config(
            CacheConfig::default(),
            fetch_fn(|_key| async { Ok(json!(null)) }),
            Arc::new(clock.clone()),
        );
        (ctx, clock)
    }

    #[test]
    fn test_refresh_config_default() {
        let config = RefreshConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert!(config.enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_entries() {
        let (ctx, clock) = create_test_context();
        ctx.set_cached_data("/api/properties", json!([]));
        clock.advance(Duration::from_secs(121));

        let handle = RefreshHandle::spawn(
            ctx.clone(),
            RefreshConfig {
                sweep_interval: Duration::from_secs(10),
                enabled: true,
            },
        );
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert!(ctx.is_empty());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_sweep_leaves_entries() {
        let (ctx, clock) = create_test_context();
        ctx.set_cached_data("/api/properties", json!([]));
        clock.advance(Duration::from_secs(121));

        let handle = RefreshHandle::spawn(
            ctx.clone(),
            RefreshConfig {
                enabled: false,
                ..Default::default()
            },
        );
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(ctx.len(), 1);
        handle.shutdown().await;
    }
}
