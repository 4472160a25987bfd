//! Registry of cache instances.

use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::error::CacheError;
use crate::lru::LruCache;
use crate::read_through::ReadThroughCache;
use crate::stats::{CacheStats, NamedCacheStats};
use crate::sweeper::{CacheSweeper, SweeperHandle};

/// Operations the manager needs from every registered cache.
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &str;

    /// Drops TTL-expired entries, returning the number removed.
    fn purge_expired(&self) -> usize;

    fn stats(&self) -> CacheStats;

    fn clear(&self);
}

/// Owns the set of caches created for one process.
///
/// Constructed explicitly at startup and handed to the components that need
/// caches; there is no global instance.
#[derive(Default)]
pub struct CacheManager {
    caches: RwLock<Vec<Arc<dyn ManagedCache>>>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an externally constructed cache.
    pub fn register(&self, cache: Arc<dyn ManagedCache>) -> Result<(), CacheError> {
        let mut caches = self.caches.write().unwrap_or_else(PoisonError::into_inner);
        if caches.iter().any(|c| c.name() == cache.name()) {
            return Err(CacheError::DuplicateName(cache.name().to_owned()));
        }
        tracing::debug!(target: "cache", cache = cache.name(), "Registered cache");
        caches.push(cache);
        Ok(())
    }

    /// Creates and registers an [`LruCache`].
    pub fn lru<K, V>(
        &self,
        name: &str,
        capacity: usize,
        ttl: Option<Duration>,
    ) -> Result<Arc<LruCache<K, V>>, CacheError>
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let cache = match ttl {
            Some(ttl) => LruCache::with_ttl(name, capacity, ttl)?,
            None => LruCache::new(name, capacity)?,
        };
        let cache = Arc::new(cache);
        self.register(cache.clone())?;
        Ok(cache)
    }

    /// Creates and registers a [`ReadThroughCache`].
    pub fn read_through<V>(
        &self,
        name: &str,
        capacity: usize,
        ttl: Option<Duration>,
    ) -> Result<Arc<ReadThroughCache<V>>, CacheError>
    where
        V: Clone + Send + 'static,
    {
        let cache = match ttl {
            Some(ttl) => ReadThroughCache::with_ttl(name, capacity, ttl)?,
            None => ReadThroughCache::new(name, capacity)?,
        };
        let cache = Arc::new(cache);
        self.register(cache.clone())?;
        Ok(cache)
    }

    fn snapshot(&self) -> Vec<Arc<dyn ManagedCache>> {
        self.caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Purges expired entries across every registered cache.
    ///
    /// Each cache is locked in turn; no two cache locks are held at once.
    pub fn purge_expired(&self) -> usize {
        self.snapshot()
            .iter()
            .map(|cache| cache.purge_expired())
            .sum()
    }

    pub fn stats(&self) -> Vec<NamedCacheStats> {
        self.snapshot()
            .iter()
            .map(|cache| NamedCacheStats {
                name: cache.name().to_owned(),
                stats: cache.stats(),
            })
            .collect()
    }

    pub fn clear_all(&self) {
        for cache in self.snapshot() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the background expiry sweep on the current Tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        CacheSweeper::spawn(Arc::clone(self), interval)
    }
}
