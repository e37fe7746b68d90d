//! Resilient Core demo
//!
//! Drives a simulated flaky upstream through a circuit breaker and retry
//! executor, caching results in TTL and LRU caches, until interrupted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resilient_core::{
    BreakerError, BreakerEvent, CircuitBreaker, Config, OperationError, RetryError, RetryEvent,
    RetryExecutor, SharedLruCache, SharedTtlCache,
};

/// Upstream that resets every third call and rejects every tenth.
#[derive(Default)]
struct FlakyUpstream {
    calls: AtomicU64,
}

impl FlakyUpstream {
    async fn fetch_block(&self, number: u64) -> Result<String, OperationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(20)).await;

        if call % 10 == 0 {
            Err(OperationError::with_code("EINVAL", "block not found"))
        } else if call % 3 == 0 {
            Err(OperationError::with_code("ECONNRESET", "socket hang up"))
        } else {
            Ok(format!("block-{}-hash-{:x}", number, number.wrapping_mul(0x9e37_79b9)))
        }
    }
}

type FetchError = BreakerError<RetryError<OperationError>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resilient Core demo");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: default_ttl={}s, cleanup_interval={}s, lru_max_size={}, retry_attempts={}, breaker_threshold={}",
        config.ttl_cache.default_ttl.as_secs(),
        config.ttl_cache.cleanup_interval.as_secs(),
        config.lru_cache.max_size,
        config.retry.max_attempts,
        config.breaker.failure_threshold
    );

    let blocks: SharedTtlCache<String> = SharedTtlCache::new(config.ttl_cache.default_ttl);
    let summaries: SharedLruCache<usize> = SharedLruCache::new(config.lru_cache.max_size);
    let cleanup_handle = blocks.start_cleanup(config.ttl_cache.cleanup_interval);

    let retries = Arc::new(AtomicU64::new(0));
    let retry_counter = Arc::clone(&retries);
    let executor = RetryExecutor::new().with_hook(Arc::new(move |event: &RetryEvent| {
        if matches!(event, RetryEvent::BackingOff { .. }) {
            retry_counter.fetch_add(1, Ordering::Relaxed);
        }
    }));
    let breaker = CircuitBreaker::new(config.breaker.clone()).with_hook(Arc::new(
        |event: &BreakerEvent| {
            if let BreakerEvent::StateChanged { from, to } = event {
                info!(%from, %to, "Upstream breaker transition");
            }
        },
    ));
    let upstream = FlakyUpstream::default();

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut next_block = 0u64;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        // Revisit recent blocks so the TTL cache gets hits.
        let number = next_block / 2;
        next_block += 1;
        let key = format!("block:{}", number);

        let fetched: Result<String, FetchError> = blocks
            .get_or_set(
                &key,
                || {
                    breaker.execute(
                        || executor.execute(|| upstream.fetch_block(number), &config.retry, &key),
                        "upstream",
                    )
                },
                None,
            )
            .await;

        match fetched {
            Ok(block) => {
                if summaries.get(&key).await.is_none() {
                    summaries.set(key.as_str(), block.len()).await;
                }
                info!(block = %block, "Fetched block");
            }
            Err(err) if err.is_open() => warn!(%key, "Upstream circuit open, skipping"),
            Err(err) => warn!(%key, error = %err, "Fetch failed"),
        }

        if next_block % 10 == 0 {
            let stats = serde_json::to_string(&blocks.stats().await)?;
            let breaker_state = serde_json::to_string(&breaker.snapshot().await)?;
            info!(
                cache = %stats,
                breaker = %breaker_state,
                retries = retries.load(Ordering::Relaxed),
                lru_entries = summaries.size().await,
                "Status"
            );
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
