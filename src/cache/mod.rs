//! Cache Module
//!
//! In-memory caches keyed by opaque strings: a TTL cache with lazy and
//! periodic expiry, and a capacity-bounded LRU cache.

mod entry;
mod lru;
mod shared;
mod stats;
mod ttl;


// Re-export public types
pub(crate) use entry::CacheEntry;
pub use lru::{LruCache, DEFAULT_MAX_SIZE};
pub use shared::{SharedLruCache, SharedTtlCache};
pub use stats::CacheStats;
pub use ttl::{TtlCache, DEFAULT_TTL};
