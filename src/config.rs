//! Configuration Module
//!
//! Loads cache, retry and circuit breaker settings from environment
//! variables, falling back to defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL};
use crate::error::ConfigError;
use crate::resilience::{CircuitBreakerConfig, RetryConfig};
use crate::tasks::DEFAULT_CLEANUP_INTERVAL;

// == TTL Cache Config ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlCacheConfig {
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Period of the background expiry sweep
    pub cleanup_interval: Duration,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

// == LRU Cache Config ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LruCacheConfig {
    pub max_size: usize,
}

impl Default for LruCacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// Complete configuration for an embedding application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub ttl_cache: TtlCacheConfig,
    pub lru_cache: LruCacheConfig,
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

impl Config {
    /// Creates a Config from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep period in seconds (default: 60)
    /// - `LRU_MAX_SIZE` - LRU capacity (default: 1000)
    /// - `RETRY_MAX_ATTEMPTS` - Attempts per call (default: 3)
    /// - `RETRY_INITIAL_DELAY_MS` - First backoff delay (default: 1000)
    /// - `RETRY_MAX_DELAY_MS` - Backoff cap (default: 30000)
    /// - `RETRY_BACKOFF_FACTOR` - Delay multiplier (default: 2)
    /// - `RETRY_RETRYABLE_ERRORS` - Comma-separated codes / message fragments
    /// - `BREAKER_FAILURE_THRESHOLD` - Failures that open the circuit (default: 5)
    /// - `BREAKER_RESET_TIMEOUT_MS` - Open-state cool-down (default: 60000)
    /// - `BREAKER_MONITORING_PERIOD_MS` - Reported only (default: 10000)
    /// - `BREAKER_SUCCESS_THRESHOLD` - Half-open successes to close (default: 2)
    ///
    /// Unset or unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let retryable_errors = env::var("RETRY_RETRYABLE_ERRORS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.retry.retryable_errors);

        Self {
            ttl_cache: TtlCacheConfig {
                default_ttl: Duration::from_secs(env_or(
                    "CACHE_DEFAULT_TTL",
                    defaults.ttl_cache.default_ttl.as_secs(),
                )),
                cleanup_interval: Duration::from_secs(env_or(
                    "CACHE_CLEANUP_INTERVAL",
                    defaults.ttl_cache.cleanup_interval.as_secs(),
                )),
            },
            lru_cache: LruCacheConfig {
                max_size: env_or("LRU_MAX_SIZE", defaults.lru_cache.max_size),
            },
            retry: RetryConfig {
                max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts),
                initial_delay: env_millis("RETRY_INITIAL_DELAY_MS", defaults.retry.initial_delay),
                max_delay: env_millis("RETRY_MAX_DELAY_MS", defaults.retry.max_delay),
                backoff_factor: env_or("RETRY_BACKOFF_FACTOR", defaults.retry.backoff_factor),
                retryable_errors,
            },
            breaker: CircuitBreakerConfig {
                failure_threshold: env_or(
                    "BREAKER_FAILURE_THRESHOLD",
                    defaults.breaker.failure_threshold,
                ),
                reset_timeout: env_millis(
                    "BREAKER_RESET_TIMEOUT_MS",
                    defaults.breaker.reset_timeout,
                ),
                monitoring_period: env_millis(
                    "BREAKER_MONITORING_PERIOD_MS",
                    defaults.breaker.monitoring_period,
                ),
                success_threshold: env_or(
                    "BREAKER_SUCCESS_THRESHOLD",
                    defaults.breaker.success_threshold,
                ),
            },
        }
    }

    /// Rejects values that make a component misbehave rather than merely
    /// behave unusually.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_cache.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "ttl_cache.cleanup_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.lru_cache.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lru_cache.max_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.backoff_factor",
                reason: format!("must be >= 1, got {}", self.retry.backoff_factor),
            });
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "breaker.failure_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_millis(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.ttl_cache.default_ttl, Duration::from_secs(300));
        assert_eq!(config.ttl_cache.cleanup_interval, Duration::from_secs(60));
        assert_eq!(config.lru_cache.max_size, 1000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert!(config.validate().is_ok());
    }

    // Single test touching the environment so parallel tests cannot race on it.
    #[test]
    fn test_config_from_env() {
        let vars = [
            "CACHE_DEFAULT_TTL",
            "LRU_MAX_SIZE",
            "RETRY_INITIAL_DELAY_MS",
            "RETRY_BACKOFF_FACTOR",
            "RETRY_RETRYABLE_ERRORS",
            "BREAKER_FAILURE_THRESHOLD",
        ];
        for var in vars {
            env::remove_var(var);
        }
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("CACHE_DEFAULT_TTL", "60");
        env::set_var("LRU_MAX_SIZE", "not-a-number");
        env::set_var("RETRY_INITIAL_DELAY_MS", "250");
        env::set_var("RETRY_BACKOFF_FACTOR", "1.5");
        env::set_var("RETRY_RETRYABLE_ERRORS", "ECONNRESET, rate limited ,");
        env::set_var("BREAKER_FAILURE_THRESHOLD", "3");

        let config = Config::from_env();
        for var in vars {
            env::remove_var(var);
        }

        assert_eq!(config.ttl_cache.default_ttl, Duration::from_secs(60));
        assert_eq!(config.lru_cache.max_size, 1000);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(250));
        assert_eq!(config.retry.backoff_factor, 1.5);
        assert_eq!(
            config.retry.retryable_errors,
            vec!["ECONNRESET".to_string(), "rate limited".to_string()]
        );
        assert_eq!(config.breaker.failure_threshold, 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.retry.backoff_factor = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "retry.backoff_factor", .. })
        ));

        let mut config = Config::default();
        config.lru_cache.max_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.breaker.failure_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ttl_cache.cleanup_interval = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "ttl_cache.cleanup_interval", .. })
        ));
    }
}
