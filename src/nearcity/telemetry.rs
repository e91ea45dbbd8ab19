use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const SERVICE_NAME: &str = "nearcity";

/// Keeps the span exporter alive. Flushes pending spans on [Telemetry::shutdown].
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
}

/// Installs the global tracing subscriber. Spans are additionally exported
/// via otlp if an endpoint is given.
pub fn init(otlp_endpoint: Option<&str>) -> Result<Telemetry> {
    let provider = otlp_endpoint.map(tracer_provider).transpose()?;

    let otel_layer = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()?;

    Ok(Telemetry { provider })
}

fn tracer_provider(endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("create otlp exporter for {:?}", endpoint))?;

    let resource = Resource::builder()
        .with_service_name(SERVICE_NAME)
        .build();

    Ok(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build()
    )
}

impl Telemetry {
    pub fn shutdown(self) {
        let Some(provider) = self.provider else { return };

        if let Err(err) = provider.shutdown() {
            warn!("Failed to flush spans: {:?}", err);
        }
    }
}
