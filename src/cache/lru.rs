//! LRU Cache Module
//!
//! Bounded key-value store that evicts the least recently used entry once
//! it reaches capacity.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::cache::CacheStats;

/// Capacity used by `LruCache::default`.
pub const DEFAULT_MAX_SIZE: usize = 1000;

// == LRU Entry ==
#[derive(Debug, Clone)]
struct LruEntry<V> {
    value: V,
    /// Wall-clock time of the last insert or `get`. Informational only;
    /// recency is decided by `seq`.
    last_access: DateTime<Utc>,
    seq: u64,
}

// == LRU Cache ==
/// Recency is tracked with a monotonically increasing sequence number per
/// touch. `order` maps sequence to key, so its first entry is always the
/// least recently used one and ties resolve in insertion order.
#[derive(Debug)]
pub struct LruCache<V> {
    entries: HashMap<String, LruEntry<V>>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
    max_size: usize,
    stats: CacheStats,
}

impl<V> Default for LruCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl<V> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_size` entries.
    /// A capacity of zero is raised to one.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            max_size: max_size.max(1),
            stats: CacheStats::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    // == Set ==
    /// Inserts or replaces `key`, making it the most recently used entry.
    /// Inserting a new key into a full cache evicts the oldest entry first.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        if let Some(old) = self.entries.remove(&key) {
            self.order.remove(&old.seq);
        } else if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let seq = self.bump_seq();
        self.order.insert(seq, key.clone());
        self.entries.insert(
            key,
            LruEntry {
                value,
                last_access: Utc::now(),
                seq,
            },
        );
    }

    // == Get ==
    /// Returns the value and marks the key as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let seq = self.next_seq;
        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return None;
        };

        self.order.remove(&entry.seq);
        self.order.insert(seq, key.to_string());
        entry.seq = seq;
        entry.last_access = Utc::now();
        self.next_seq += 1;
        self.stats.record_hit();

        Some(&entry.value)
    }

    // == Peek ==
    /// Returns the value without changing recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Has ==
    /// Membership test. Does not promote the key.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.order.remove(&entry.seq);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.order.values().cloned().collect()
    }

    pub fn last_access(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.last_access)
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats
    }

    // == Evict Oldest ==
    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        self.stats.record_eviction();
        Some(key)
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
