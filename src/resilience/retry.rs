//! Retry Executor
//!
//! Runs a fallible async operation up to `max_attempts` times, sleeping with
//! exponential backoff between retryable failures.

use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::RetryError;
use crate::hooks::{emit, EventHook, RetryEvent};
use crate::resilience::backoff::scale;
use crate::resilience::classify::{is_retryable, Classify};

/// Error markers retried when no list is configured.
pub const DEFAULT_RETRYABLE_ERRORS: [&str; 4] =
    ["ECONNRESET", "ETIMEDOUT", "ECONNREFUSED", "EHOSTUNREACH"];

// == Retry Config ==
/// Per-call retry policy. Defaults: 3 attempts, 1s initial delay doubling up
/// to 30s, retrying common connection errors.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total invocations allowed, including the first. Zero behaves as one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Codes or message fragments that mark an error as retryable
    pub retryable_errors: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            retryable_errors: DEFAULT_RETRYABLE_ERRORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_retryable_errors<I, S>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_errors = errors.into_iter().map(Into::into).collect();
        self
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

// == Retry Executor ==
/// Stateless apart from an optional event hook; one executor can serve any
/// number of concurrent calls.
#[derive(Clone, Default)]
pub struct RetryExecutor {
    hook: Option<EventHook<RetryEvent>>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl RetryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: EventHook<RetryEvent>) -> Self {
        self.hook = Some(hook);
        self
    }

    // == Execute ==
    /// Invokes `operation` until it succeeds, fails with a non-retryable
    /// error, or `config.max_attempts` invocations have failed.
    ///
    /// Attempts are strictly sequential. The only suspension added by the
    /// executor is the backoff sleep between attempts; the operation itself
    /// is never timed out or cancelled.
    pub async fn execute<T, E, F, Fut>(
        &self,
        mut operation: F,
        config: &RetryConfig,
        context: &str,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        let context = if context.is_empty() { "operation" } else { context };
        let max_attempts = config.attempts();
        // Uncapped; each sleep is clamped to `max_delay`.
        let mut raw_delay = config.initial_delay;
        let mut attempt = 1;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= max_attempts {
                warn!(context, attempts = attempt, error = %error.message(), "Retries exhausted");
                emit(
                    &self.hook,
                    RetryEvent::Exhausted {
                        context: context.to_string(),
                        attempts: attempt,
                        error: error.message().into_owned(),
                    },
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    context: context.to_string(),
                    last_error: error,
                });
            }

            let retryable = is_retryable(&error, &config.retryable_errors);
            debug!(context, attempt, retryable, error = %error.message(), "Attempt failed");
            emit(
                &self.hook,
                RetryEvent::AttemptFailed {
                    context: context.to_string(),
                    attempt,
                    retryable,
                    error: error.message().into_owned(),
                },
            );

            if !retryable {
                return Err(RetryError::NonRetryable(error));
            }

            let delay = raw_delay.min(config.max_delay);
            warn!(
                context,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Retryable failure, backing off"
            );
            emit(
                &self.hook,
                RetryEvent::BackingOff {
                    context: context.to_string(),
                    attempt,
                    delay,
                },
            );

            tokio::time::sleep(delay).await;
            raw_delay = scale(raw_delay, config.backoff_factor);
            attempt += 1;
        }
    }

    // == Batch Retry ==
    /// Runs `execute` over every operation concurrently and returns each
    /// outcome in input order. One operation exhausting its attempts does
    /// not affect the others.
    pub async fn batch_retry<T, E, F, Fut>(
        &self,
        operations: Vec<F>,
        config: &RetryConfig,
        context: &str,
    ) -> Vec<Result<T, RetryError<E>>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        let calls = operations.into_iter().enumerate().map(|(index, operation)| {
            let context = format!("{}[{}]", context, index);
            async move { self.execute(operation, config, &context).await }
        });

        join_all(calls).await
    }
}

/// Retries `operation` with a default executor. Plain higher-order
/// replacement for attaching retry behaviour to a method.
pub async fn retry<T, E, F, Fut>(
    operation: F,
    config: &RetryConfig,
    context: &str,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    RetryExecutor::new().execute(operation, config, context).await
}
