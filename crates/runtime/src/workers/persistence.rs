//! Periodic snapshot sweep over an [`ActorSystem`].
//!
//! Each tick queues a persist envelope on every mailbox, so the snapshot is
//! taken between handlers and I/O only stalls the owning actor. A final
//! waited pass runs when the worker is stopped.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::WorkerHandle;
use crate::actor::{ActorFactory, ActorSystem};

pub struct PersistenceWorker<F: ActorFactory> {
    system: Weak<ActorSystem<F>>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl<F: ActorFactory> PersistenceWorker<F> {
    pub fn spawn(system: Arc<ActorSystem<F>>, interval: Duration) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = Self {
            system: Arc::downgrade(&system),
            interval,
            shutdown_rx,
        };
        WorkerHandle::new("persistence", shutdown_tx, tokio::spawn(worker.run()))
    }

    async fn run(mut self) {
        info!(target: "runtime::worker", interval = ?self.interval, "Persistence sweep started");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(system) = self.system.upgrade() else { break };
                    let queued = system.request_persist_all();
                    debug!(target: "runtime::worker", queued, "Persistence sweep");
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        if let Some(system) = self.system.upgrade() {
                            let report = system.persist_all().await;
                            info!(
                                target: "runtime::worker",
                                saved = report.saved,
                                failed = report.failed,
                                "Final persistence sweep"
                            );
                        }
                        break;
                    }
                }
            }
        }

        info!(target: "runtime::worker", "Persistence sweep stopped");
    }
}
