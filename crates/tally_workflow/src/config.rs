//! Workflow configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tally_error::ConfigError;

/// Settings for the verification workflow.
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
#[builder(default, setter(into))]
pub struct WorkflowConfig {
    /// Action name the store keys verification permissions by
    #[serde(default = "default_verification_action")]
    verification_action: String,

    /// How long a rendered session stays in the cache (seconds)
    #[serde(default = "default_session_ttl_secs")]
    session_ttl_secs: u64,

    /// How long a guild's permission lookup stays in the cache (seconds)
    #[serde(default = "default_permission_ttl_secs")]
    permission_ttl_secs: u64,

    /// Deadline for a single store call (milliseconds)
    #[serde(default = "default_store_timeout_ms")]
    store_timeout_ms: u64,

    /// The bot's own user id; its triggers are ignored
    #[serde(default)]
    #[setters(strip_option)]
    bot_user_id: Option<String>,
}

fn default_verification_action() -> String {
    "verification".to_string()
}

fn default_session_ttl_secs() -> u64 {
    600
}

fn default_permission_ttl_secs() -> u64 {
    600
}

fn default_store_timeout_ms() -> u64 {
    5000
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            verification_action: default_verification_action(),
            session_ttl_secs: default_session_ttl_secs(),
            permission_ttl_secs: default_permission_ttl_secs(),
            store_timeout_ms: default_store_timeout_ms(),
            bot_user_id: None,
        }
    }
}

impl WorkflowConfig {
    /// Session TTL as a duration.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Permission TTL as a duration.
    pub fn permission_ttl(&self) -> Duration {
        Duration::from_secs(self.permission_ttl_secs)
    }

    /// Store deadline as a duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Reject settings the workflow cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verification_action.trim().is_empty() {
            return Err(ConfigError::new("workflow.verification_action must not be empty"));
        }
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::new("workflow.session_ttl_secs must be positive"));
        }
        if self.permission_ttl_secs == 0 {
            return Err(ConfigError::new("workflow.permission_ttl_secs must be positive"));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::new("workflow.store_timeout_ms must be positive"));
        }
        Ok(())
    }
}
