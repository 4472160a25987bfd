//! Read-through cache with per-key data dependencies.
//!
//! Each cached key records the data categories ("tables") it was derived
//! from. Invalidating a table walks only that table's dependents, so the cost
//! is proportional to the number of affected keys rather than the cache size.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::CacheError;
use crate::lru::LruCore;
use crate::manager::ManagedCache;
use crate::stats::CacheStats;

#[derive(Debug)]
struct ReadThroughCore<V> {
    lru: LruCore<String, V>,
    /// table → keys depending on it
    dependents: HashMap<String, HashSet<String>>,
    /// key → tables it depends on
    key_tables: HashMap<String, Vec<String>>,
}

impl<V: Clone> ReadThroughCore<V> {
    fn forget(&mut self, key: &str) {
        let Some(tables) = self.key_tables.remove(key) else {
            return;
        };
        for table in tables {
            if let Some(keys) = self.dependents.get_mut(&table) {
                keys.remove(key);
                if keys.is_empty() {
                    self.dependents.remove(&table);
                }
            }
        }
    }

    fn insert(&mut self, key: String, value: V, tables: &[&str], ttl: Option<Duration>) {
        self.forget(&key);
        let evicted = self.lru.insert(key.clone(), value, ttl, Instant::now());
        for victim in &evicted {
            self.forget(victim);
        }

        let tables: Vec<String> = tables.iter().map(|t| (*t).to_owned()).collect();
        for table in &tables {
            self.dependents
                .entry(table.clone())
                .or_default()
                .insert(key.clone());
        }
        self.key_tables.insert(key, tables);
    }

    fn get(&mut self, key: &str) -> Option<V> {
        let (value, expired) = self.lru.get(&key.to_owned(), Instant::now());
        if let Some(expired) = expired {
            self.forget(&expired);
        }
        value
    }
}

/// Cache for expensive lookups that can be invalidated by data category.
#[derive(Debug)]
pub struct ReadThroughCache<V> {
    name: String,
    inner: Mutex<ReadThroughCore<V>>,
}

impl<V: Clone> ReadThroughCache<V> {
    pub fn new(name: impl Into<String>, capacity: usize) -> Result<Self, CacheError> {
        Self::build(name.into(), capacity, None)
    }

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
            inner: Mutex::new(ReadThroughCore {
                lru: LruCore::new(capacity, ttl),
                dependents: HashMap::new(),
                key_tables: HashMap::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ReadThroughCore<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key)
    }

    /// Stores `value` under `key`, tagged with the tables it depends on.
    pub fn put(&self, key: impl Into<String>, value: V, tables: &[&str]) {
        self.lock().insert(key.into(), value, tables, None);
    }

    pub fn put_with_ttl(&self, key: impl Into<String>, value: V, tables: &[&str], ttl: Duration) {
        self.lock().insert(key.into(), value, tables, Some(ttl));
    }

    /// Returns the cached value or runs `loader` and caches its output.
    ///
    /// The lock is released while `loader` runs; two concurrent misses for the
    /// same key may both load, and the later insert wins.
    pub fn get_or_try_load<E, F>(&self, key: &str, tables: &[&str], loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = loader()?;
        self.put(key, value.clone(), tables);
        Ok(value)
    }

    /// Like [`Self::get_or_try_load`] for loaders that may find nothing.
    ///
    /// Misses are not cached.
    pub fn get_or_load_optional<F>(&self, key: &str, tables: &[&str], loader: F) -> Option<V>
    where
        F: FnOnce() -> Option<V>,
    {
        if let Some(value) = self.get(key) {
            return Some(value);
        }
        let value = loader()?;
        self.put(key, value.clone(), tables);
        Some(value)
    }

    /// Drops every key depending on `table` and returns how many were cached.
    pub fn invalidate_table(&self, table: &str) -> usize {
        let mut core = self.lock();
        let Some(keys) = core.dependents.remove(table) else {
            return 0;
        };

        let mut removed = 0;
        for key in keys {
            core.forget(&key);
            if core.lru.remove(&key).is_some() {
                removed += 1;
            }
        }
        core.lru.counters.invalidations += removed as u64;

        tracing::debug!(
            target: "cache",
            cache = %self.name,
            table,
            removed,
            "Invalidated table dependents"
        );
        removed
    }

    pub fn invalidate_key(&self, key: &str) -> bool {
        let mut core = self.lock();
        core.forget(key);
        let removed = core.lru.remove(&key.to_owned()).is_some();
        if removed {
            core.lru.counters.invalidations += 1;
        }
        removed
    }

    /// Number of cached keys currently depending on `table`.
    pub fn dependents_of(&self, table: &str) -> usize {
        self.lock().dependents.get(table).map_or(0, HashSet::len)
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut core = self.lock();
        core.lru.clear();
        core.dependents.clear();
        core.key_tables.clear();
    }

    pub fn purge_expired(&self) -> usize {
        let mut core = self.lock();
        let expired = core.lru.purge_expired(Instant::now());
        for key in &expired {
            core.forget(key);
        }
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().lru.stats()
    }
}

impl<V: Clone + Send> ManagedCache for ReadThroughCache<V> {
    fn name(&self) -> &str {
        ReadThroughCache::name(self)
    }

    fn purge_expired(&self) -> usize {
        ReadThroughCache::purge_expired(self)
    }

    fn stats(&self) -> CacheStats {
        ReadThroughCache::stats(self)
    }

    fn clear(&self) {
        ReadThroughCache::clear(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_table_removes_exactly_its_dependents() {
        let cache = ReadThroughCache::new("lookups", 16).unwrap();
        cache.put("species:emberfox", 1, &["species"]);
        cache.put("move:ember", 2, &["moves"]);
        cache.put("matchup:ember:leafling", 3, &["moves", "type_chart"]);

        assert_eq!(cache.invalidate_table("moves"), 2);

        assert_eq!(cache.get("species:emberfox"), Some(1));
        assert_eq!(cache.get("move:ember"), None);
        assert_eq!(cache.get("matchup:ember:leafling"), None);
        assert_eq!(cache.dependents_of("moves"), 0);
        // The multi-table key no longer lingers under its other table.
        assert_eq!(cache.dependents_of("type_chart"), 0);
        assert_eq!(cache.invalidate_table("moves"), 0);
    }

    #[test]
    fn loader_runs_only_on_miss() {
        let cache = ReadThroughCache::new("lookups", 4).unwrap();
        let mut calls = 0;

        for _ in 0..3 {
            let value: Result<u32, ()> = cache.get_or_try_load("k", &["t"], || {
                calls += 1;
                Ok(7)
            });
            assert_eq!(value, Ok(7));
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn loader_errors_are_not_cached() {
        let cache = ReadThroughCache::<u32>::new("lookups", 4).unwrap();
        let failed: Result<u32, &str> = cache.get_or_try_load("k", &["t"], || Err("down"));
        assert_eq!(failed, Err("down"));
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_load_optional("k", &["t"], || None), None);
        assert_eq!(cache.dependents_of("t"), 0);
    }

    #[test]
    fn eviction_releases_dependencies() {
        let cache = ReadThroughCache::new("lookups", 2).unwrap();
        cache.put("a", 1, &["t"]);
        cache.put("b", 2, &["t"]);
        cache.put("c", 3, &["u"]);

        assert_eq!(cache.dependents_of("t"), 1);
        assert_eq!(cache.invalidate_table("t"), 1);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn reinserting_retags_key() {
        let cache = ReadThroughCache::new("lookups", 4).unwrap();
        cache.put("a", 1, &["old"]);
        cache.put("a", 2, &["new"]);

        assert_eq!(cache.invalidate_table("old"), 0);
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.invalidate_table("new"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_release_dependencies() {
        let cache = ReadThroughCache::with_ttl("lookups", 4, Duration::from_secs(1)).unwrap();
        cache.put("a", 1, &["t"]);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.dependents_of("t"), 0);
    }
}
