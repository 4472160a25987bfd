//! Cache entry bookkeeping.

use std::time::Duration;

use tokio::time::Instant;

/// A single cached value with its expiry and usage metadata.
///
/// Entries are owned by the cache that holds them and are never handed out;
/// callers only receive clones of `value`.
#[derive(Clone, Debug)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: V,
    pub created_at: Instant,
    /// `None` means the entry never expires on its own.
    pub ttl: Option<Duration>,
    pub access_count: u64,
    /// Recency tick of the last insert or hit.
    pub(crate) last_used: u64,
}

impl<K, V> CacheEntry<K, V> {
    pub(crate) fn new(key: K, value: V, ttl: Option<Duration>, now: Instant, tick: u64) -> Self {
        Self {
            key,
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_used: tick,
        }
    }

    /// Returns true once the entry has lived for at least its TTL.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at) >= ttl,
            None => false,
        }
    }

    /// Remaining lifetime, `None` for entries without a TTL.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.ttl
            .map(|ttl| ttl.saturating_sub(now.saturating_duration_since(self.created_at)))
    }
}
