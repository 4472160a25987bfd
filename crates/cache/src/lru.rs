//! Fixed-capacity LRU cache with per-entry TTL.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::manager::ManagedCache;
use crate::stats::{CacheStats, Counters};

/// Lock-free core shared by [`LruCache`] and the read-through cache.
///
/// Recency is tracked with a monotonically increasing tick per touch; the
/// `recency` index maps tick → key so the LRU victim is the first entry.
#[derive(Debug)]
pub(crate) struct LruCore<K, V> {
    entries: HashMap<K, CacheEntry<K, V>>,
    recency: BTreeMap<u64, K>,
    tick: u64,
    capacity: usize,
    default_ttl: Option<Duration>,
    pub(crate) counters: Counters,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(capacity: usize, default_ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            recency: BTreeMap::new(),
            tick: 0,
            capacity,
            default_ttl,
            counters: Counters::default(),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &K) {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.last_used);
            entry.last_used = tick;
            self.recency.insert(tick, key.clone());
        }
    }

    /// Looks up a key, dropping it first if its TTL has elapsed.
    ///
    /// Returns the value and, when the lookup expired the entry, its key so
    /// callers can release dependent bookkeeping.
    pub(crate) fn get(&mut self, key: &K, now: Instant) -> (Option<V>, Option<K>) {
        let expired = match self.entries.get(key) {
            None => {
                self.counters.misses += 1;
                return (None, None);
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.remove(key);
            self.counters.expirations += 1;
            self.counters.misses += 1;
            return (None, Some(key.clone()));
        }

        self.touch(key);
        self.counters.hits += 1;
        let entry = self.entries.get_mut(key).map(|entry| {
            entry.access_count += 1;
            entry.value.clone()
        });
        (entry, None)
    }

    /// Checks presence without affecting recency or statistics.
    pub(crate) fn contains(&self, key: &K, now: Instant) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Inserts or replaces a value. Returns keys evicted to make room.
    pub(crate) fn insert(&mut self, key: K, value: V, ttl: Option<Duration>, now: Instant) -> Vec<K> {
        if self.capacity == 0 {
            return Vec::new();
        }

        let ttl = ttl.or(self.default_ttl);
        let tick = self.next_tick();

        if let Some(entry) = self.entries.get_mut(&key) {
            self.recency.remove(&entry.last_used);
            entry.value = value;
            entry.ttl = ttl;
            entry.created_at = now;
            entry.last_used = tick;
            self.recency.insert(tick, key);
            return Vec::new();
        }

        let mut evicted = Vec::new();
        while self.entries.len() >= self.capacity {
            let Some((_, victim)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&victim);
            self.counters.evictions += 1;
            evicted.push(victim);
        }

        self.recency.insert(tick, key.clone());
        self.entries
            .insert(key.clone(), CacheEntry::new(key, value, ttl, now, tick));
        evicted
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.last_used);
        Some(entry.value)
    }

    /// Drops every expired entry and returns the dropped keys.
    pub(crate) fn purge_expired(&mut self, now: Instant) -> Vec<K> {
        let expired: Vec<K> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        self.counters.expirations += expired.len() as u64;
        expired
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats::from_counters(self.counters, self.entries.len(), self.capacity)
    }

    pub(crate) fn entry(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.entries.get(key)
    }
}

/// Thread-safe LRU cache with optional per-entry TTL.
///
/// A `get` bumps recency, so every operation takes the single instance lock.
#[derive(Debug)]
pub struct LruCache<K, V> {
    name: String,
    inner: Mutex<LruCore<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache whose entries never expire unless given a TTL.
    pub fn new(name: impl Into<String>, capacity: usize) -> Result<Self, CacheError> {
        Self::build(name.into(), capacity, None)
    }

    /// Creates a cache applying `ttl` to entries inserted without one.
    pub fn with_ttl(
        name: impl Into<String>,
        capacity: usize,
        ttl: Duration,
    ) -> Result<Self, CacheError> {
        Self::build(name.into(), capacity, Some(ttl))
    }

    fn build(name: String, capacity: usize, ttl: Option<Duration>) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity(name));
        }
        Ok(Self {
            name,
            inner: Mutex::new(LruCore::new(capacity, ttl)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LruCore<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key, Instant::now()).0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains(key, Instant::now())
    }

    pub fn put(&self, key: K, value: V) {
        self.insert(key, value, None);
    }

    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.insert(key, value, Some(ttl));
    }

    fn insert(&self, key: K, value: V, ttl: Option<Duration>) {
        let evicted = self.lock().insert(key, value, ttl, Instant::now());
        if !evicted.is_empty() {
            tracing::trace!(
                target: "cache",
                cache = %self.name,
                evicted = evicted.len(),
                "LRU eviction"
            );
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut core = self.lock();
        let removed = core.remove(key);
        if removed.is_some() {
            core.counters.invalidations += 1;
        }
        removed
    }

    /// Access count of a live entry, `None` when absent.
    pub fn access_count(&self, key: &K) -> Option<u64> {
        self.lock().entry(key).map(|entry| entry.access_count)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired(Instant::now()).len()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }
}

impl<K, V> ManagedCache for LruCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn name(&self) -> &str {
        LruCache::name(self)
    }

    fn purge_expired(&self) -> usize {
        LruCache::purge_expired(self)
    }

    fn stats(&self) -> CacheStats {
        LruCache::stats(self)
    }

    fn clear(&self) {
        LruCache::clear(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<&'static str, u32> {
        LruCache::new("test", capacity).unwrap()
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = LruCache::<u8, u8>::new("empty", 0).unwrap_err();
        assert_eq!(err, CacheError::ZeroCapacity("empty".into()));
    }

    #[test]
    fn access_protects_entry_from_eviction() {
        let cache = cache(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.get(&"a"), Some(1));
        cache.put("d", 4);

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.get(&"d"), Some(4));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn replacing_a_key_does_not_evict() {
        let cache = cache(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn counts_hits_misses_and_accesses() {
        let cache = cache(2);
        cache.put("a", 1);
        cache.get(&"a");
        cache.get(&"a");
        cache.get(&"missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(cache.access_count(&"a"), Some(2));
    }

    #[test]
    fn contains_does_not_bump_recency() {
        let cache = cache(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert!(cache.contains(&"a"));
        cache.put("c", 3);

        assert!(!cache.contains(&"a"));
        assert_eq!(cache.stats().hits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = LruCache::with_ttl("ttl", 4, Duration::from_secs(10)).unwrap();
        cache.put("a", 1);
        cache.put_with_ttl("b", 2, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get(&"a"), Some(1));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_entries() {
        let cache = LruCache::new("purge", 4).unwrap();
        cache.put_with_ttl("short", 1, Duration::from_secs(1));
        cache.put("forever", 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"forever"), Some(2));
    }
}
