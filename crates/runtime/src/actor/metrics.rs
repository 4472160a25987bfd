//! Counters for the actor system.

use std::sync::atomic::{AtomicU64, Ordering};

/// Actor system metrics.
///
/// Uses atomics for lock-free access from every mailbox task.
#[derive(Debug, Default)]
pub struct SystemMetrics {
    spawned: AtomicU64,
    restored: AtomicU64,
    stopped: AtomicU64,
    tells: AtomicU64,
    asks: AtomicU64,
    ask_timeouts: AtomicU64,
    handled: AtomicU64,
    panics: AtomicU64,
    snapshots_saved: AtomicU64,
    snapshot_failures: AtomicU64,
}

impl SystemMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_spawned(&self) {
        self.spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_restored(&self) {
        self.restored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tell(&self) {
        self.tells.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ask(&self) {
        self.asks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ask_timeout(&self) {
        self.ask_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handled(&self) {
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_snapshot_saved(&self) {
        self.snapshots_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_snapshot_failure(&self) {
        self.snapshot_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Actors currently resident: spawned plus restored minus stopped.
    pub fn live_actors(&self) -> u64 {
        let started = self.spawned.load(Ordering::Relaxed) + self.restored.load(Ordering::Relaxed);
        started.saturating_sub(self.stopped.load(Ordering::Relaxed))
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Individual fields are read atomically; the snapshot as a whole may be
    /// inconsistent while messages are in flight.
    pub fn snapshot(&self) -> SystemMetricsSnapshot {
        SystemMetricsSnapshot {
            spawned: self.spawned.load(Ordering::Relaxed),
            restored: self.restored.load(Ordering::Relaxed),
            stopped: self.stopped.load(Ordering::Relaxed),
            tells: self.tells.load(Ordering::Relaxed),
            asks: self.asks.load(Ordering::Relaxed),
            ask_timeouts: self.ask_timeouts.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            snapshots_saved: self.snapshots_saved.load(Ordering::Relaxed),
            snapshot_failures: self.snapshot_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`SystemMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemMetricsSnapshot {
    pub spawned: u64,
    pub restored: u64,
    pub stopped: u64,
    pub tells: u64,
    pub asks: u64,
    pub ask_timeouts: u64,
    pub handled: u64,
    pub panics: u64,
    pub snapshots_saved: u64,
    pub snapshot_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_actor_count_tracks_lifecycle() {
        let metrics = SystemMetrics::new();
        metrics.record_spawned();
        metrics.record_spawned();
        metrics.record_restored();
        metrics.record_stopped();
        assert_eq!(metrics.live_actors(), 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.spawned, 2);
        assert_eq!(snapshot.restored, 1);
        assert_eq!(snapshot.stopped, 1);
    }
}
