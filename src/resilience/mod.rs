//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a downstream dependency:
//!     → circuit_breaker.rs (fail fast while the dependency is deemed unhealthy)
//!     → retry.rs (classify failures, retry retryable ones with backoff)
//!     → the operation itself
//! ```
//!
//! The pieces never call each other; callers compose them, typically a
//! retried call nested inside one breaker per dependency.

pub mod backoff;
pub mod circuit_breaker;
pub mod classify;
pub mod retry;

pub use backoff::{backoff_delay, BackoffSchedule};
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use classify::{is_retryable, Classify};
pub use retry::{retry, RetryConfig, RetryExecutor, DEFAULT_RETRYABLE_ERRORS};
