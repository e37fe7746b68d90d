//! TTL Cache Module
//!
//! Key-value store where every entry carries an absolute expiration instant.
//! Expired entries are dropped lazily on read and in bulk by `cleanup`.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats};

/// Default TTL applied when `set` is called without one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

// == TTL Cache ==
/// Single-owner TTL cache. Wrap it in [`SharedTtlCache`](crate::cache::SharedTtlCache)
/// to share it between tasks.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
    default_ttl: Duration,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> TtlCache<V> {
    // == Constructor ==
    /// Creates an empty cache whose entries live for `default_ttl` unless
    /// `set` overrides it.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry and
    /// restarting its expiry clock.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.set_at(key.into(), value, ttl, Instant::now());
    }

    pub(crate) fn set_at(&mut self, key: String, value: V, ttl: Option<Duration>, now: Instant) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(key, CacheEntry::new(value, ttl, now));
    }

    // == Get ==
    /// Returns the value if present and unexpired. An expired entry found
    /// here is removed.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: Instant) -> Option<&V> {
        if self.remove_if_expired(key, now) {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(&entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Same answer and expiry side effect as `get`, without touching stats.
    pub fn has(&mut self, key: &str) -> bool {
        self.has_at(key, Instant::now())
    }

    pub(crate) fn has_at(&mut self, key: &str, now: Instant) -> bool {
        !self.remove_if_expired(key, now) && self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes the entry; returns whether one was stored.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Size ==
    /// Number of stored entries, including expired ones not yet removed.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.ttl_remaining_at(now))
    }

    /// Keys of all stored entries, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Cleanup ==
    /// Removes every expired entry and returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub(crate) fn cleanup_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        self.stats.record_expirations(removed);
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats
    }

    fn remove_if_expired(&mut self, key: &str, now: Instant) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
        }
        expired
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1, None);

        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let mut cache: TtlCache<u32> = TtlCache::default();
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_default_ttl_is_five_minutes() {
        let cache: TtlCache<u32> = TtlCache::default();
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_lazy_expiry_on_get() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        let now = Instant::now();
        cache.set_at("a".to_string(), 1, None, now);

        assert_eq!(cache.get_at("a", now + Duration::from_secs(59)), Some(&1));
        assert_eq!(cache.get_at("a", now + Duration::from_secs(60)), None);
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_explicit_ttl_overrides_default() {
        let mut cache = TtlCache::new(Duration::from_secs(300));
        let now = Instant::now();
        cache.set_at("short".to_string(), 1, Some(Duration::from_secs(5)), now);

        assert!(!cache.has_at("short", now + Duration::from_secs(6)));
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let mut cache = TtlCache::new(Duration::from_secs(10));
        let now = Instant::now();
        cache.set_at("a".to_string(), 1, None, now);
        cache.set_at("a".to_string(), 2, None, now + Duration::from_secs(8));

        assert_eq!(cache.get_at("a", now + Duration::from_secs(15)), Some(&2));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_has_removes_expired_entry() {
        let mut cache = TtlCache::new(Duration::from_secs(1));
        let now = Instant::now();
        cache.set_at("a".to_string(), 1, None, now);

        assert!(cache.has_at("a", now));
        assert_eq!(cache.stats().hits, 0);
        assert!(!cache.has_at("a", now + Duration::from_secs(2)));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1, None);
        cache.set("b", 2, None);

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_size_counts_unswept_expired_entries() {
        let mut cache = TtlCache::new(Duration::from_secs(1));
        let now = Instant::now();
        cache.set_at("a".to_string(), 1, None, now);
        cache.set_at("b".to_string(), 2, None, now);

        // Both entries are logically expired but nothing has read or swept them.
        assert!(cache.entries.values().all(|e| e.is_expired_at(now + Duration::from_secs(5))));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        let now = Instant::now();
        cache.set_at("short".to_string(), 1, Some(Duration::from_secs(1)), now);
        cache.set_at("short2".to_string(), 2, Some(Duration::from_secs(2)), now);
        cache.set_at("long".to_string(), 3, Some(Duration::from_secs(100)), now);

        let removed = cache.cleanup_at(now + Duration::from_secs(10));

        assert_eq!(removed, 2);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get_at("long", now + Duration::from_secs(10)), Some(&3));
        assert_eq!(cache.get_at("short", now + Duration::from_secs(10)), None);
        assert_eq!(cache.stats().expirations, 2);
    }

    #[test]
    fn test_cleanup_empty_cache() {
        let mut cache: TtlCache<u32> = TtlCache::default();
        assert_eq!(cache.cleanup(), 0);
    }

    #[test]
    fn test_ttl_remaining_and_keys() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1, Some(Duration::from_secs(30)));

        let remaining = cache.ttl_remaining("a").unwrap();
        assert!(remaining <= Duration::from_secs(30));
        assert!(remaining > Duration::from_secs(29));
        assert!(cache.ttl_remaining("missing").is_none());
        assert_eq!(cache.keys(), vec!["a".to_string()]);
    }
}
