//! Per-operation timing for battle actors.
//!
//! One [`BattleMetrics`] is shared by every battle actor built by the same
//! factory, so the numbers aggregate across battles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::Operation;

#[derive(Debug, Default)]
struct OperationCounters {
    calls: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl OperationCounters {
    fn record(&self, elapsed: Duration, success: bool) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }
}

/// Call counts and latencies per [`Operation`].
#[derive(Debug, Default)]
pub struct BattleMetrics {
    operations: [OperationCounters; Operation::ALL.len()],
}

impl BattleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: Operation, elapsed: Duration, success: bool) {
        self.operations[operation.index()].record(elapsed, success);
    }

    pub fn calls(&self, operation: Operation) -> u64 {
        self.operations[operation.index()]
            .calls
            .load(Ordering::Relaxed)
    }

    /// Stats for every operation called at least once.
    pub fn snapshot(&self) -> Vec<OperationStats> {
        Operation::ALL
            .iter()
            .filter_map(|&operation| {
                let counters = &self.operations[operation.index()];
                let calls = counters.calls.load(Ordering::Relaxed);
                if calls == 0 {
                    return None;
                }
                let total = counters.total_nanos.load(Ordering::Relaxed);
                Some(OperationStats {
                    operation: operation.as_str(),
                    calls,
                    failures: counters.failures.load(Ordering::Relaxed),
                    avg: Duration::from_nanos(total / calls),
                    max: Duration::from_nanos(counters.max_nanos.load(Ordering::Relaxed)),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStats {
    pub operation: &'static str,
    pub calls: u64,
    pub failures: u64,
    pub avg: Duration,
    pub max: Duration,
}
