//! Periodic reaping of idle battles.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::WorkerHandle;
use crate::battle::BattleManager;

pub struct CleanupWorker {
    manager: Weak<BattleManager>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl CleanupWorker {
    pub fn spawn(manager: Arc<BattleManager>, interval: Duration) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = Self {
            manager: Arc::downgrade(&manager),
            interval,
            shutdown_rx,
        };
        WorkerHandle::new("cleanup", shutdown_tx, tokio::spawn(worker.run()))
    }

    async fn run(mut self) {
        info!(target: "runtime::worker", interval = ?self.interval, "Cleanup sweep started");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(manager) = self.manager.upgrade() else { break };
                    let reaped = manager.cleanup_idle().await;
                    debug!(target: "runtime::worker", reaped, "Cleanup sweep");
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!(target: "runtime::worker", "Cleanup sweep stopped");
    }
}
