//! Installs the global `tracing` subscriber: compact stdout output filtered by `RUST_LOG`, plus
//! span export to an OTLP collector when one is configured.

use std::env;

use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// The collector endpoint spans are exported to.
pub const OTLP_URL_ENVVAR: &str = "BOLT_BRIDGE_OTLP_URL";

/// A label that tells apart processes sharing a service name, e.g. several relayer bots.
pub const SVC_LABEL_ENVVAR: &str = "BOLT_BRIDGE_SVC_LABEL";

/// Set to `1` to print the source file and line of every event.
pub const LOG_SOURCE_ENVVAR: &str = "BOLT_BRIDGE_LOG_SOURCE";

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The OTLP exporter could not be built for the configured endpoint.
    #[error("could not build the span exporter for {url}: {reason}")]
    Exporter {
        /// The configured endpoint.
        url: String,
        /// Why the exporter was rejected.
        reason: String,
    },

    /// Another global subscriber is already installed.
    #[error("could not install the subscriber: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// How a process wants to be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    service: String,
    otlp_url: Option<String>,
    source_locations: bool,
}

impl LoggerConfig {
    /// Reads the configuration of the process named `base` from the environment.
    pub fn from_env(base: &str) -> Self {
        Self {
            service: service_name(base, env::var(SVC_LABEL_ENVVAR).ok().as_deref()),
            otlp_url: env::var(OTLP_URL_ENVVAR).ok(),
            source_locations: env::var(LOG_SOURCE_ENVVAR).is_ok_and(|v| v == "1"),
        }
    }

    /// The name spans are exported under.
    pub fn service(&self) -> &str {
        &self.service
    }
}

/// `base`, suffixed with `%label` when a label is given.
fn service_name(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

/// Builds the layer that exports spans to the collector at `url`.
fn otlp_layer(url: &str, service: &str) -> Result<impl Layer<Registry>, LoggingError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(url)
        .build()
        .map_err(|e| LoggingError::Exporter {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

    let provider = SdkTracerProvider::builder()
        .with_resource(
            Resource::builder()
                .with_attribute(KeyValue::new("service.name", service.to_owned()))
                .build(),
        )
        .with_batch_exporter(exporter)
        .build();

    Ok(tracing_opentelemetry::layer().with_tracer(provider.tracer("bolt-bridge")))
}

/// Installs the global subscriber described by `config`.
pub fn init(config: LoggerConfig) -> Result<(), LoggingError> {
    let stdout = fmt::layer()
        .compact()
        .with_file(config.source_locations)
        .with_line_number(config.source_locations)
        .with_filter(EnvFilter::from_default_env());

    let otlp = config
        .otlp_url
        .as_deref()
        .map(|url| otlp_layer(url, &config.service))
        .transpose()?;

    tracing_subscriber::registry()
        .with(otlp)
        .with(stdout)
        .try_init()?;

    info!(service = %config.service, exporting = config.otlp_url.is_some(), "logging started");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_suffixes_service_name() {
        assert_eq!(service_name("bolt-sim", None), "bolt-sim");
        assert_eq!(service_name("bolt-sim", Some("eu-1")), "bolt-sim%eu-1");
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        let config = LoggerConfig {
            service: "bolt-sim".to_owned(),
            otlp_url: Some("not a url".to_owned()),
            source_locations: false,
        };

        assert!(matches!(
            init(config),
            Err(LoggingError::Exporter { .. } | LoggingError::AlreadyInstalled(_))
        ));
    }
}
