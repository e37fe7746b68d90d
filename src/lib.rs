//! Resilient Core - retry, circuit breaking and in-memory caching
//!
//! Provides a retry executor with exponential backoff, a three-state circuit
//! breaker, and TTL / LRU caches with a periodic expiry sweep.

pub mod cache;
pub mod config;
pub mod error;
pub mod hooks;
pub mod resilience;
pub mod tasks;

pub use cache::{CacheStats, LruCache, SharedLruCache, SharedTtlCache, TtlCache};
pub use config::Config;
pub use error::{BreakerError, OperationError, RetryError};
pub use hooks::{BreakerEvent, CleanupEvent, EventHook, RetryEvent};
pub use resilience::{
    retry, CircuitBreaker, CircuitBreakerConfig, CircuitState, Classify, RetryConfig,
    RetryExecutor,
};
pub use tasks::spawn_cleanup_task;
