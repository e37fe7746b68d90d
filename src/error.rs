//! Error types for the resilience core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Retry Error ==
/// Terminal failure of a retried operation.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error outside the retryable set.
    /// The original error is carried unmodified.
    #[error("{0}")]
    NonRetryable(E),

    /// Every allowed attempt failed; carries the last attempt's error.
    #[error("{context}: failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        attempts: u32,
        context: String,
        last_error: E,
    },
}

impl<E> RetryError<E> {
    /// Returns the underlying operation error.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::NonRetryable(err) => err,
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }

    /// Borrows the underlying operation error.
    pub fn inner(&self) -> &E {
        match self {
            RetryError::NonRetryable(err) => err,
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }

    /// Number of times the operation was invoked before giving up.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::NonRetryable(_) => None,
            RetryError::Exhausted { attempts, .. } => Some(*attempts),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

// == Breaker Error ==
/// Failure of a call routed through a circuit breaker.
#[derive(Error, Debug)]
pub enum BreakerError<E> {
    /// The circuit is open; the operation was never invoked.
    #[error("circuit breaker is open ({context})")]
    Open { context: String },

    /// The operation ran and failed.
    #[error("{0}")]
    Operation(E),
}

impl<E> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    /// Returns the operation error, or `None` for a circuit-open rejection.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BreakerError::Open { .. } => None,
            BreakerError::Operation(err) => Some(err),
        }
    }
}

// == Operation Error ==
/// General-purpose error for wrapped operations that want code-based
/// retry classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct OperationError {
    /// Machine-readable code such as `ECONNRESET`
    pub code: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

// == Config Error ==
/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
