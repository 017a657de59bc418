//! Layered configuration.

use crate::ObservabilityConfig;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tally_cache::CacheConfig;
use tally_error::{ConfigError, TallyResult};
use tally_workflow::{TriggerConfig, TriggerTable, WorkflowConfig};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../tally.toml");

/// Everything the verification core can be configured with.
///
/// # Example
///
/// ```no_run
/// use tally::TallyConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TallyConfig::load()?;
/// println!("sessions live {}s", config.workflow().session_ttl_secs());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct TallyConfig {
    /// Cache backend settings
    #[serde(default)]
    cache: CacheConfig,
    /// Workflow settings
    #[serde(default)]
    workflow: WorkflowConfig,
    /// Trigger names
    #[serde(default)]
    triggers: TriggerConfig,
    /// Logging and tracing
    #[serde(default)]
    observability: ObservabilityConfig,
}

impl TallyConfig {
    /// Load configuration with precedence (later sources override earlier):
    /// 1. Bundled defaults (tally.toml shipped with the crate)
    /// 2. User config in home directory (~/.config/tally/tally.toml)
    /// 3. User config in current directory (./tally.toml)
    /// 4. Environment variables such as `TALLY__CACHE__REDIS_URL`
    ///
    /// User config files are optional and skipped if not found.
    #[instrument]
    pub fn load() -> TallyResult<Self> {
        debug!("Loading configuration: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tally/tally.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("tally").required(false))
            .add_source(environment());

        Self::from_builder(builder)
    }

    /// Load bundled defaults overridden by a specific file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TallyResult<Self> {
        debug!("Loading configuration from file");
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));
        Self::from_builder(builder)
    }

    /// Build, deserialize and validate.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> TallyResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.workflow.validate()?;
        TriggerTable::from_config(&self.triggers)?;
        if *self.cache.max_size() == 0 {
            return Err(ConfigError::new("cache.max_size must be positive"));
        }
        if *self.cache.operation_timeout_ms() == 0 {
            return Err(ConfigError::new("cache.operation_timeout_ms must be positive"));
        }
        Ok(())
    }
}

/// `TALLY__SECTION__KEY` environment overrides.
pub(crate) fn environment() -> Environment {
    Environment::with_prefix("TALLY")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
