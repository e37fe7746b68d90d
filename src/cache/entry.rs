//! Cache Entry Module
//!
//! Defines the structure for individual TTL cache entries.

use std::time::Duration;

use tokio::time::Instant;

/// Upper bound applied when `now + ttl` would overflow the clock.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Entry ==
/// A stored value with its absolute expiration instant.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant from which the entry is logically absent
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl`.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(MAX_TTL))
            .unwrap_or(now);

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// An entry is expired once `now` reaches its expiration instant, so a
    /// value is never served after its full TTL has elapsed.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}
