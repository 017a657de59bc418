//! Cache configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the keyed cache.
///
/// # Examples
///
/// ```
/// use tally_cache::CacheConfig;
///
/// let config = CacheConfig::default().with_max_size(50);
/// assert_eq!(*config.max_size(), 50);
/// assert!(config.redis_url().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct CacheConfig {
    /// Default TTL for entries written without an explicit one (seconds)
    #[serde(default = "default_ttl_secs")]
    default_ttl_secs: u64,

    /// Maximum number of entries held in process
    #[serde(default = "default_max_size")]
    max_size: u64,

    /// Redis connection string; the in-process cache is used when unset
    #[serde(default)]
    #[setters(strip_option)]
    redis_url: Option<String>,

    /// Deadline for a single cache operation (milliseconds)
    #[serde(default = "default_operation_timeout_ms")]
    operation_timeout_ms: u64,
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_max_size() -> u64 {
    1000
}

fn default_operation_timeout_ms() -> u64 {
    500
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            max_size: default_max_size(),
            redis_url: None,
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl CacheConfig {
    /// Default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Operation deadline as a duration.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}
