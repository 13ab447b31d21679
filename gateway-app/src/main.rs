//! # Payment Gateway Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the store adapter
//! - Build provider routing and the adapter factory
//! - Create the payment orchestrator
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    metrics::SdkMeterProvider, propagation::TraceContextPropagator, trace as sdktrace,
};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use gateway_hex::{AppState, HttpServer, PaymentService};
use gateway_providers::{
    ProviderAdapterFactory, ProviderKind, ProviderResolver, build_http_client,
};
use gateway_repo::build_repo;

use config::{Config, LogFormat};

const DEFAULT_FILTER: &str = "info,gateway_app=debug,gateway_hex=debug,gateway_providers=debug";

struct Telemetry {
    tracer_provider: sdktrace::SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    fn shutdown(self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            tracing::warn!(error = %e, "Failed to flush traces");
        }
        if let Err(e) = self.meter_provider.shutdown() {
            tracing::warn!(error = %e, "Failed to flush metrics");
        }
    }
}

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("payment-gateway"), provider))
}

/// Installs the global meter provider read by the HTTP metrics layer.
fn init_meter(endpoint: &str) -> anyhow::Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .build();

    global::set_meter_provider(provider.clone());
    Ok(provider)
}

fn init_tracing(config: &Config) -> anyhow::Result<Option<Telemetry>> {
    let (otel_layer, telemetry) = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let (tracer, tracer_provider) = init_tracer(endpoint)?;
            let meter_provider = init_meter(endpoint)?;
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(Telemetry {
                    tracer_provider,
                    meter_provider,
                }),
            )
        }
        None => (None, None),
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    Ok(telemetry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    let telemetry = init_tracing(&config)?;

    tracing::info!("Starting payment gateway on port {}", config.port);

    // Build store (handles connection and migration)
    let repo = Arc::new(build_repo(&config.database_url).await?);

    // Provider routing and adapters share the store and one HTTP client
    let resolver = ProviderResolver::new(Arc::clone(&repo));
    let client = build_http_client(config.provider_timeout)?;
    let factory =
        ProviderAdapterFactory::new(resolver.clone(), config.credentials.clone(), client);

    match factory.unsupported_providers().await {
        Ok(names) => {
            for name in names {
                tracing::warn!(provider = %name, "Configured provider has no adapter; requests routed to it will fail");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not list configured providers"),
    }
    for kind in ProviderKind::ALL {
        if config.credentials.for_kind(kind).is_empty() {
            tracing::warn!(provider = %kind, "No credentials configured");
        }
    }

    // Create the payment orchestrator
    let service = PaymentService::new(repo, resolver, factory);
    let state = AppState::new(service, config.app_host.as_str(), config.provider_timeout);

    // Create and run the HTTP server
    let server = HttpServer::new(state, &config.auth_token);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces and metrics are flushed before exit
    if let Some(telemetry) = telemetry {
        telemetry.shutdown();
    }
    Ok(())
}
