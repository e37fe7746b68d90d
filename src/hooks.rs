//! Event Hooks
//!
//! Callback points for retries, breaker transitions and cache sweeps, so an
//! embedding application can attach its own telemetry.

use std::sync::Arc;
use std::time::Duration;

use crate::resilience::CircuitState;

/// A shared callback invoked synchronously with each emitted event.
pub type EventHook<E> = Arc<dyn Fn(&E) + Send + Sync>;

// == Retry Events ==
#[derive(Debug, Clone, PartialEq)]
pub enum RetryEvent {
    /// An attempt failed.
    AttemptFailed {
        context: String,
        attempt: u32,
        retryable: bool,
        error: String,
    },
    /// A retryable failure; the executor sleeps `delay` before the next attempt.
    BackingOff {
        context: String,
        attempt: u32,
        delay: Duration,
    },
    /// All attempts were used up; `error` is the final failure's message.
    Exhausted {
        context: String,
        attempts: u32,
        error: String,
    },
}

// == Breaker Events ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakerEvent {
    StateChanged {
        from: CircuitState,
        to: CircuitState,
    },
    /// A call was rejected because the circuit is open.
    Rejected { context: String },
}

// == Cleanup Events ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupEvent {
    /// One periodic sweep finished.
    Swept { removed: usize },
}

/// Invokes the hook if one is installed.
pub(crate) fn emit<E>(hook: &Option<EventHook<E>>, event: E) {
    if let Some(hook) = hook {
        hook(&event);
    }
}
