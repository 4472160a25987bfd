//! Background task purging expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::manager::CacheManager;

pub(crate) struct CacheSweeper {
    manager: Arc<CacheManager>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl CacheSweeper {
    pub(crate) fn spawn(manager: Arc<CacheManager>, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = Self {
            manager,
            interval,
            shutdown_rx,
        };
        let handle = tokio::spawn(sweeper.run());
        SweeperHandle {
            shutdown_tx,
            handle,
        }
    }

    async fn run(mut self) {
        info!(target: "cache", interval = ?self.interval, "Cache sweeper started");
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.manager.purge_expired();
                    if purged > 0 {
                        debug!(target: "cache", purged, "Purged expired cache entries");
                    }
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!(target: "cache", "Cache sweeper stopped");
    }
}

/// Handle to a running sweeper; dropping it stops the sweep as well.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_on_interval() {
        let manager = Arc::new(CacheManager::new());
        let cache = manager
            .lru::<&str, u32>("swept", 4, Some(Duration::from_secs(5)))
            .unwrap();
        cache.put("a", 1);

        let sweeper = manager.spawn_sweeper(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
        sweeper.stop().await;
    }
}
