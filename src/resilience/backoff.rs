//! Exponential backoff.

use std::time::Duration;

use crate::resilience::RetryConfig;

/// Delay after the `failure`-th retryable failure (1-based):
/// `min(initial_delay * backoff_factor^(failure - 1), max_delay)`.
pub fn backoff_delay(failure: u32, config: &RetryConfig) -> Duration {
    if failure == 0 {
        return Duration::ZERO;
    }

    let mut raw = config.initial_delay;
    for _ in 1..failure {
        // A non-shrinking factor can never bring the delay back under the cap.
        if raw >= config.max_delay && config.backoff_factor >= 1.0 {
            break;
        }
        raw = scale(raw, config.backoff_factor);
    }
    raw.min(config.max_delay)
}

/// Multiplies `delay` by `factor`, saturating instead of overflowing.
/// The result is uncapped; callers clamp it to `max_delay` when sleeping.
pub(crate) fn scale(delay: Duration, factor: f64) -> Duration {
    // Scale in whole nanoseconds so integral factors stay exact.
    let scaled = (delay.as_nanos() as f64 * factor).round();
    if !scaled.is_finite() || scaled >= u64::MAX as f64 {
        return Duration::from_nanos(u64::MAX);
    }
    Duration::from_nanos(scaled.max(0.0) as u64)
}

// == Backoff Schedule ==
/// Successive delays for consecutive retryable failures. Infinite; the
/// caller bounds it by attempt count.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    raw: Duration,
    config: RetryConfig,
}

impl BackoffSchedule {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            raw: config.initial_delay,
            config: config.clone(),
        }
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.raw.min(self.config.max_delay);
        self.raw = scale(self.raw, self.config.backoff_factor);
        Some(current)
    }
}
