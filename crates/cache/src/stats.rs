//! Cache statistics.

use serde::Serialize;

/// Running counters kept inside each cache core.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidations: u64,
}

/// Point-in-time statistics for one cache instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room for new ones.
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
    /// Entries dropped through explicit invalidation.
    pub invalidations: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub(crate) fn from_counters(counters: Counters, size: usize, capacity: usize) -> Self {
        Self {
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            expirations: counters.expirations,
            invalidations: counters.invalidations,
            size,
            capacity,
        }
    }

    /// Hit ratio in `[0, 1]`; zero when the cache was never read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of capacity in use, in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.size as f64 / self.capacity as f64
        }
    }
}

/// Statistics tagged with the registered cache name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedCacheStats {
    pub name: String,
    #[serde(flatten)]
    pub stats: CacheStats,
}
