//! In-process caches shared by the battle engine and the actor runtime.
//!
//! Two cache flavors are provided:
//! - [`LruCache`] is a fixed-capacity map with per-entry TTL and
//!   least-recently-used eviction.
//! - [`ReadThroughCache`] layers dependency tracking on top of the same core so
//!   that invalidating a data category ("table") drops exactly the keys derived
//!   from it.
//!
//! Every cache instance owns a single mutex; readers and writers both take it
//! because a hit mutates recency and statistics. [`CacheManager`] keeps a
//! registry of instances for aggregated statistics and runs the background
//! expiry sweep.
mod entry;
mod error;
mod lru;
mod manager;
mod read_through;
mod stats;
mod sweeper;

pub use entry::CacheEntry;
pub use error::CacheError;
pub use lru::LruCache;
pub use manager::{CacheManager, ManagedCache};
pub use read_through::ReadThroughCache;
pub use stats::{CacheStats, NamedCacheStats};
pub use sweeper::SweeperHandle;
