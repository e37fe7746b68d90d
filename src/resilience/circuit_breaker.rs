//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: downstream assumed down, calls fail fast
//! - Half-Open: probing whether the downstream recovered
//!
//! # State Transitions
//! ```text
//! Closed    → Open:      failure_count >= failure_threshold
//! Open      → Half-Open: next call after reset_timeout has elapsed
//! Half-Open → Closed:    success_threshold consecutive successes
//! Half-Open → Open:      any failure
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::BreakerError;
use crate::hooks::{emit, BreakerEvent, EventHook};

// == Circuit State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(name)
    }
}

// == Config ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open a closed circuit
    pub failure_threshold: u32,
    /// Time an open circuit waits before letting a probe through
    pub reset_timeout: Duration,
    /// Stored and reported only; no transition depends on it.
    pub monitoring_period: Duration,
    /// Consecutive half-open successes that close the circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_millis(60_000),
            monitoring_period: Duration::from_millis(10_000),
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    pub fn with_monitoring_period(mut self, period: Duration) -> Self {
        self.monitoring_period = period;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }
}

// == Snapshot ==
/// Point-in-time view of a breaker, suitable for health endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub millis_since_last_failure: Option<u64>,
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
    pub monitoring_period_ms: u64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
        }
    }
}

// == Circuit Breaker ==
/// Long-lived guard around one downstream dependency. Clones share state,
/// so a single breaker can be handed to every call site of that dependency.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: Arc<CircuitBreakerConfig>,
    state: Arc<Mutex<BreakerState>>,
    hook: Option<EventHook<BreakerEvent>>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(BreakerState::closed())),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: EventHook<BreakerEvent>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    // == Execute ==
    /// Runs `operation` unless the circuit is open.
    ///
    /// The admission check and the outcome update each run under the state
    /// lock; the operation itself runs without it, so concurrent calls
    /// update the breaker in the order they complete.
    pub async fn execute<T, E, F, Fut>(
        &self,
        operation: F,
        context: &str,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.admit(context).await {
            return Err(BreakerError::Open {
                context: context.to_string(),
            });
        }

        match operation().await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(error) => {
                self.record_failure(context).await;
                Err(BreakerError::Operation(error))
            }
        }
    }

    /// Returns false when the call must be rejected.
    async fn admit(&self, context: &str) -> bool {
        let mut guard = self.state.lock().await;

        if guard.state == CircuitState::Open {
            let cooled_down = guard
                .last_failure_time
                .map_or(true, |at| at.elapsed() >= self.config.reset_timeout);

            if cooled_down {
                guard.success_count = 0;
                self.transition(&mut guard, CircuitState::HalfOpen);
            }
        }

        if guard.state == CircuitState::Open {
            emit(
                &self.hook,
                BreakerEvent::Rejected {
                    context: context.to_string(),
                },
            );
            return false;
        }
        true
    }

    async fn record_success(&self) {
        let mut guard = self.state.lock().await;
        guard.failure_count = 0;

        if guard.state == CircuitState::HalfOpen {
            guard.success_count += 1;
            if guard.success_count >= self.config.success_threshold {
                guard.success_count = 0;
                self.transition(&mut guard, CircuitState::Closed);
            }
        }
    }

    async fn record_failure(&self, context: &str) {
        let mut guard = self.state.lock().await;
        guard.failure_count = guard.failure_count.saturating_add(1);
        guard.last_failure_time = Some(Instant::now());

        match guard.state {
            CircuitState::HalfOpen => {
                warn!(context, "Probe failed while half-open");
                self.transition(&mut guard, CircuitState::Open);
            }
            CircuitState::Closed if guard.failure_count >= self.config.failure_threshold => {
                warn!(
                    context,
                    failures = guard.failure_count,
                    "Failure threshold reached"
                );
                self.transition(&mut guard, CircuitState::Open);
            }
            _ => {}
        }
    }

    fn transition(&self, guard: &mut BreakerState, to: CircuitState) {
        let from = guard.state;
        if from == to {
            return;
        }
        guard.state = to;

        match to {
            CircuitState::Open => warn!(%from, %to, "Circuit breaker opened"),
            _ => info!(%from, %to, "Circuit breaker state changed"),
        }
        emit(&self.hook, BreakerEvent::StateChanged { from, to });
    }

    // == Inspection ==
    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.state
    }

    pub async fn failure_count(&self) -> u32 {
        self.state.lock().await.failure_count
    }

    pub async fn success_count(&self) -> u32 {
        self.state.lock().await.success_count
    }

    pub async fn snapshot(&self) -> BreakerSnapshot {
        let guard = self.state.lock().await;
        BreakerSnapshot {
            state: guard.state,
            failure_count: guard.failure_count,
            success_count: guard.success_count,
            millis_since_last_failure: guard
                .last_failure_time
                .map(|at| at.elapsed().as_millis() as u64),
            failure_threshold: self.config.failure_threshold,
            reset_timeout_ms: self.config.reset_timeout.as_millis() as u64,
            monitoring_period_ms: self.config.monitoring_period.as_millis() as u64,
        }
    }

    // == Reset ==
    /// Forces the circuit closed and zeroes every counter.
    pub async fn reset(&self) {
        let mut guard = self.state.lock().await;
        guard.failure_count = 0;
        guard.success_count = 0;
        guard.last_failure_time = None;
        self.transition(&mut guard, CircuitState::Closed);
    }
}
