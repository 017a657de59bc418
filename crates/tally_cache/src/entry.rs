//! Cache entries.

use derive_getters::Getters;
use std::time::{Duration, Instant};

/// A stored payload with its expiry.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    value: String,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// Create an entry that expires `ttl` from now.
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.created_at.elapsed())
    }

    /// Take the payload.
    pub fn into_value(self) -> String {
        self.value
    }
}
