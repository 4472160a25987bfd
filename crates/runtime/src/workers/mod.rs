//! Background sweeps that back the runtime.
//!
//! The persistence worker snapshots dirty actors on an interval; the cleanup
//! worker force-ends battles that went idle. Both stop on a watch signal and
//! exit when their owner is dropped.

mod cleanup;
mod persistence;

pub use cleanup::CleanupWorker;
pub use persistence::PersistenceWorker;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running worker.
pub struct WorkerHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    pub(crate) fn new(
        name: &'static str,
        shutdown_tx: watch::Sender<bool>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            name,
            shutdown_tx,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signals the worker and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(
                target: "runtime::worker",
                worker = self.name,
                "Worker join failed: {}",
                e
            );
        }
    }
}
