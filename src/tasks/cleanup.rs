//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries,
//! independent of read traffic.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedTtlCache;
use crate::hooks::{emit, CleanupEvent, EventHook};

/// Sweep period used when none is configured.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawns a task that sweeps `cache` every `interval`.
///
/// The task holds the cache's write lock only for the duration of each
/// sweep, so it interleaves safely with concurrent reads and writes. It runs
/// until the returned handle is aborted.
///
/// # Example
/// ```ignore
/// let cache = SharedTtlCache::<String>::new(Duration::from_secs(300));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60), None);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(
    cache: SharedTtlCache<V>,
    interval: Duration,
    hook: Option<EventHook<CleanupEvent>>,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup().await;

            if removed > 0 {
                info!(removed, "TTL cleanup: removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
            emit(&hook, CleanupEvent::Swept { removed });
        }
    })
}
