//! Shared Cache Handles
//!
//! Cloneable, task-safe handles around the single-owner caches. Every clone
//! refers to the same underlying store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::cache::{CacheStats, LruCache, TtlCache};
use crate::hooks::{CleanupEvent, EventHook};
use crate::tasks::spawn_cleanup_task;

// == Shared TTL Cache ==
#[derive(Debug)]
pub struct SharedTtlCache<V> {
    inner: Arc<RwLock<TtlCache<V>>>,
}

impl<V> Clone for SharedTtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SharedTtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self::from_cache(TtlCache::new(default_ttl))
    }

    pub fn from_cache(cache: TtlCache<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.inner.write().await.set(key, value, ttl);
    }

    /// Write lock: an expired entry is removed on read.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.write().await.get(key).cloned()
    }

    pub async fn has(&self, key: &str) -> bool {
        self.inner.write().await.has(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.inner.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn size(&self) -> usize {
        self.inner.read().await.size()
    }

    pub async fn cleanup(&self) -> usize {
        self.inner.write().await.cleanup()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    // == Get Or Set ==
    /// Returns the cached value, or runs `fetch` and caches its result.
    ///
    /// The lock is released while `fetch` runs, so concurrent misses on the
    /// same key may each call their own `fetch`; the last writer wins. A
    /// failed fetch caches nothing.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        self.set(key, value.clone(), ttl).await;
        Ok(value)
    }

    // == Cleanup Lifecycle ==
    /// Starts the periodic expiry sweep. Abort the returned handle to stop it.
    pub fn start_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        spawn_cleanup_task(self.clone(), interval, None)
    }

    pub fn start_cleanup_with_hook(
        &self,
        interval: Duration,
        hook: EventHook<CleanupEvent>,
    ) -> JoinHandle<()> {
        spawn_cleanup_task(self.clone(), interval, Some(hook))
    }
}

// == Shared LRU Cache ==
#[derive(Debug)]
pub struct SharedLruCache<V> {
    inner: Arc<RwLock<LruCache<V>>>,
}

impl<V> Clone for SharedLruCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> SharedLruCache<V> {
    pub fn new(max_size: usize) -> Self {
        Self::from_cache(LruCache::new(max_size))
    }

    pub fn from_cache(cache: LruCache<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.inner.write().await.set(key, value);
    }

    /// Write lock: a hit reorders recency.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.write().await.get(key).cloned()
    }

    pub async fn peek(&self, key: &str) -> Option<V> {
        self.inner.read().await.peek(key).cloned()
    }

    pub async fn has(&self, key: &str) -> bool {
        self.inner.read().await.has(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.inner.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn size(&self) -> usize {
        self.inner.read().await.size()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}
