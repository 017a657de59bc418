//! Logging and tracing setup.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tally_error::{ConfigError, TallyResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for logging and tracing.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_", into)]
pub struct ObservabilityConfig {
    /// Service name for telemetry attribution
    #[serde(default = "default_service_name")]
    service_name: String,
    /// Log level filter (e.g., "info", "tally_workflow=debug"); `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    log_level: String,
    /// Enable JSON-formatted logs for structured logging
    #[serde(default)]
    json_logs: bool,
    /// Export spans to stdout through OpenTelemetry (needs the `observability` feature)
    #[serde(default)]
    otel_stdout: bool,
}

fn default_service_name() -> String {
    "tally".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            json_logs: false,
            otel_stdout: false,
        }
    }
}

fn env_filter(config: &ObservabilityConfig) -> TallyResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ConfigError::new(format!("Invalid log level '{}': {}", config.log_level, e)).into())
}

fn fmt_layer<S>(config: &ObservabilityConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed()
    }
}

/// Install the global tracing subscriber.
///
/// This sets up:
/// - an env filter from `RUST_LOG` or the configured level
/// - text or JSON formatted logs
/// - with the `observability` feature and `otel_stdout`, an OpenTelemetry bridge
///   exporting spans to stdout
///
/// Fails if a global subscriber is already installed.
pub fn init_observability(config: &ObservabilityConfig) -> TallyResult<()> {
    let registry = tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(fmt_layer(config));

    #[cfg(feature = "observability")]
    let (registry, provider) = {
        let (layer, provider) = match otel::pipeline(config) {
            Some((layer, provider)) => (Some(layer), Some(provider)),
            None => (None, None),
        };
        (registry.with(layer), provider)
    };

    registry
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)))?;

    // Only the call that installed the subscriber owns the global provider.
    #[cfg(feature = "observability")]
    {
        if let Some(provider) = provider {
            otel::install(provider);
        }
    }
    tracing::debug!(service = %config.service_name, "Observability initialised");
    Ok(())
}

/// Flush telemetry before exit.
///
/// Providers flush on drop, so this only matters for API compatibility with exporters
/// that batch.
pub fn shutdown_observability() {
    #[cfg(feature = "observability")]
    otel::shutdown();
}

#[cfg(feature = "observability")]
mod otel {
    use super::ObservabilityConfig;
    use opentelemetry::{KeyValue, global, trace::TracerProvider};
    use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
    use opentelemetry_stdout::SpanExporter;
    use std::sync::OnceLock;
    use tracing_subscriber::{Layer, registry::LookupSpan};

    static PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

    /// OpenTelemetry layer and the provider behind it, or `None` when span export is off.
    ///
    /// Nothing global is touched until [`install`].
    pub(super) fn pipeline<S>(
        config: &ObservabilityConfig,
    ) -> Option<(Box<dyn Layer<S> + Send + Sync>, SdkTracerProvider)>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        if !config.otel_stdout {
            return None;
        }

        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .with_attributes(vec![KeyValue::new(
                "service.version",
                env!("CARGO_PKG_VERSION"),
            )])
            .build();

        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(SpanExporter::default())
            .with_resource(resource)
            .build();

        let tracer = provider.tracer(config.service_name.clone());
        Some((
            tracing_opentelemetry::layer().with_tracer(tracer).boxed(),
            provider,
        ))
    }

    /// Make `provider` the global tracer provider.
    pub(super) fn install(provider: SdkTracerProvider) {
        global::set_tracer_provider(provider.clone());
        if PROVIDER.set(provider).is_err() {
            tracing::warn!("Tracer provider already installed");
        }
    }

    #[cfg(test)]
    pub(super) fn installed() -> bool {
        PROVIDER.get().is_some()
    }

    pub(super) fn shutdown() {
        if let Some(provider) = PROVIDER.get() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to shut down tracer provider");
            }
        }
    }
}
