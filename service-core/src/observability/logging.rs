use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

/// Installs the global subscriber: env filter, JSON formatter on stderr and,
/// when an OTLP endpoint is given, span export through OpenTelemetry.
///
/// `RUST_LOG` takes precedence over `log_level`.
pub fn init_tracing(
    service_name: &str,
    log_level: &str,
    otlp_endpoint: Option<&str>,
) -> Result<(), AppError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let tracer = otlp_endpoint
        .map(|endpoint| otlp_tracer(service_name, endpoint))
        .transpose()?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to install subscriber: {}", e)))
}

fn otlp_tracer(service_name: &str, endpoint: &str) -> Result<sdktrace::Tracer, AppError> {
    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(runtime::Tokio)
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}",
                service_name,
                endpoint,
                e
            ))
        })
}
