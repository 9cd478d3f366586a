//! Telemetry setup for OpenTelemetry integration

use anyhow::Result;
use tracing_subscriber::{Layer, Registry};

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the OpenTelemetry layer if an exporter endpoint is configured
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: guildtune)
///
/// Returns `Ok(None)` when no endpoint is set. Called before the subscriber
/// is installed, so failures are returned for the caller to log.
pub fn layer() -> Result<Option<BoxedLayer>> {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(None);
    };

    #[cfg(feature = "telemetry")]
    {
        otlp_layer(&endpoint).map(Some)
    }

    #[cfg(not(feature = "telemetry"))]
    {
        anyhow::bail!(
            "OTEL_EXPORTER_OTLP_ENDPOINT={} set but feature 'telemetry' not enabled \
             (rebuild with: cargo build --features telemetry)",
            endpoint
        )
    }
}

#[cfg(feature = "telemetry")]
fn otlp_layer(endpoint: &str) -> Result<BoxedLayer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "guildtune".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .build();
    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(Box::new(tracing_opentelemetry::layer().with_tracer(tracer)))
}

/// Flush pending spans
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
