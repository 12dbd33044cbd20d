//! Background purge of expired cache entries.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::store::CacheHandler;

/// Spawns a task that purges expired entries every `sweep_interval`.
///
/// Lookups already ignore expired entries; the sweep only returns their
/// memory. Abort the handle at shutdown.
pub fn spawn_sweeper(cache: Arc<CacheHandler>) -> JoinHandle<()> {
    let period = cache.config().sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = cache.len(), "Expired cache entries purged");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::{CacheConfig, CachePolicy};

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_on_interval() {
        let cache = Arc::new(CacheHandler::new(CacheConfig {
            sweep_interval_ms: 1_000,
            ..Default::default()
        }));
        cache.set("k:v", 1_u8, CachePolicy::new(Duration::from_millis(500), 1));

        let handle = spawn_sweeper(Arc::clone(&cache));
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert!(cache.is_empty());
        handle.abort();
    }
}
