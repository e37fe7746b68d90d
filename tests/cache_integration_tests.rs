//! Integration Tests for the caches
//!
//! Exercises the public cache API the way an embedding service would.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resilient_core::cache::{LruCache, SharedLruCache, SharedTtlCache, TtlCache};
use resilient_core::hooks::{CleanupEvent, EventHook};
use resilient_core::spawn_cleanup_task;

// == TTL Scenario ==

#[tokio::test(start_paused = true)]
async fn test_ttl_end_to_end_expiry() {
    let cache = SharedTtlCache::new(Duration::from_secs(60));

    cache.set("a", 1, None).await;
    assert_eq!(cache.get("a").await, Some(1));

    tokio::time::advance(Duration::from_secs(61)).await;

    assert_eq!(cache.get("a").await, None);
    assert_eq!(cache.size().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_size_overcounts_until_swept() {
    let cache = SharedTtlCache::new(Duration::from_secs(10));
    cache.set("a", "x".to_string(), None).await;
    cache.set("b", "y".to_string(), Some(Duration::from_secs(100))).await;

    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(cache.size().await, 2);

    assert_eq!(cache.cleanup().await, 1);
    assert_eq!(cache.size().await, 1);
    assert!(cache.has("b").await);
}

#[tokio::test(start_paused = true)]
async fn test_background_sweep_with_concurrent_writers() {
    let cache: SharedTtlCache<u64> = SharedTtlCache::new(Duration::from_secs(1));
    let sweeps = Arc::new(AtomicUsize::new(0));
    let removed_total = Arc::new(AtomicUsize::new(0));

    let (sweeps_hook, removed_hook) = (Arc::clone(&sweeps), Arc::clone(&removed_total));
    let hook: EventHook<CleanupEvent> = Arc::new(move |event: &CleanupEvent| {
        let CleanupEvent::Swept { removed } = *event;
        sweeps_hook.fetch_add(1, Ordering::SeqCst);
        removed_hook.fetch_add(removed, Ordering::SeqCst);
    });
    let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(5), Some(hook));

    let writers: Vec<_> = (0..4u64)
        .map(|w| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..10u64 {
                    cache.set(format!("w{}-{}", w, i), i, None).await;
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    handle.abort();

    assert_eq!(cache.size().await, 0);
    assert_eq!(removed_total.load(Ordering::SeqCst), 40);
    assert!(sweeps.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_get_or_set_is_best_effort_under_concurrency() {
    let cache: SharedTtlCache<u32> = SharedTtlCache::new(Duration::from_secs(60));
    let fetches = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(tokio::sync::Barrier::new(3));

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let cache = cache.clone();
            let fetches = Arc::clone(&fetches);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                cache
                    .get_or_set(
                        "shared",
                        || async move {
                            fetches.fetch_add(1, Ordering::SeqCst);
                            // Every caller misses before any of them stores.
                            gate.wait().await;
                            Ok::<_, Infallible>(99)
                        },
                        None,
                    )
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Ok(99));
    }

    // No single-flight: each concurrent miss ran its own fetch.
    assert_eq!(fetches.load(Ordering::SeqCst), 3);
    assert_eq!(cache.get("shared").await, Some(99));
}

// == LRU Scenarios ==

#[test]
fn test_lru_overflow_evicts_first_inserted() {
    let mut cache = LruCache::new(3);
    for key in ["k1", "k2", "k3", "k4"] {
        cache.set(key, key.len());
    }

    assert!(!cache.has("k1"));
    assert!(cache.has("k2") && cache.has("k3") && cache.has("k4"));
}

#[test]
fn test_lru_get_promotes_but_has_does_not() {
    let mut cache = LruCache::new(3);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);

    cache.get("a");
    cache.has("b");
    cache.set("d", 4);

    assert!(cache.has("a"));
    assert!(!cache.has("b"));
    assert_eq!(cache.keys_by_recency(), vec!["c", "a", "d"]);
}

#[tokio::test]
async fn test_shared_lru_across_tasks() {
    let cache = SharedLruCache::new(100);

    let tasks: Vec<_> = (0..10)
        .map(|t| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..20 {
                    cache.set(format!("{}:{}", t, i), i).await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(cache.size().await, 100);
    assert_eq!(cache.stats().await.evictions, 100);
}

#[test]
fn test_ttl_stats_track_hits_and_misses() {
    let mut cache = TtlCache::new(Duration::from_secs(60));
    cache.set("a", 1, None);

    cache.get("a");
    cache.get("a");
    cache.get("b");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total_entries, 1);
}
