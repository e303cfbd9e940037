use anyhow::Context;
use axum::{
    extract::Request,
    routing::{get, post},
    Router, ServiceExt,
};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    trace::{Sampler, SdkTracerProvider},
    Resource,
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{fmt, fmt::format::FmtSpan, prelude::*, EnvFilter};

use crate::api::handlers::*;
use crate::config::{Config, StoreBackend};
use crate::db::{create_pool, run_migrations, Database, MemoryDatabase, PgDatabase};

const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn,hyper=warn,tower=warn";
const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4318/v1/traces";

/// Shared by every request; each request opens its own unit of work from `db`
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

pub fn init_tracing() {
    let enable_otel = env::var("OTEL_ENABLED").map(|v| v == "true").unwrap_or(false);

    // Span close events duplicate what the exporter already records
    let span_events = if enable_otel { FmtSpan::NONE } else { FmtSpan::CLOSE };

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(false)
                .with_span_events(span_events),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)));

    if !enable_otel {
        subscriber.init();
        return;
    }

    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_else(|_| DEFAULT_OTLP_ENDPOINT.to_string());
    match init_opentelemetry(&endpoint) {
        Ok(provider) => {
            opentelemetry::global::set_tracer_provider(provider.clone());
            let tracer = provider.tracer("waste-router");

            subscriber.with(OpenTelemetryLayer::new(tracer)).init();
            info!("OpenTelemetry enabled: {}", endpoint);
        }
        Err(e) => {
            subscriber.init();
            error!("Failed to initialize OpenTelemetry: {}. Continuing with logs only.", e);
        }
    }
}

fn init_opentelemetry(endpoint: &str) -> Result<SdkTracerProvider, Box<dyn std::error::Error>> {
    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "waste-router".to_string());

    let sampling_rate = env::var("OTEL_TRACE_SAMPLING_RATE")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(1.0)
        .clamp(0.0, 1.0);

    let resource = Resource::builder()
        .with_attribute(KeyValue::new("service.name", service_name))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build();

    // http(s) endpoints go to the OTLP/HTTP collector port, anything else over gRPC
    let exporter = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        SpanExporter::builder().with_http().with_endpoint(endpoint).build()?
    } else {
        SpanExporter::builder().with_tonic().with_endpoint(endpoint).build()?
    };

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::TraceIdRatioBased(sampling_rate))
        .with_batch_exporter(exporter)
        .build();

    info!("OpenTelemetry sampling rate: {}%", sampling_rate * 100.0);
    Ok(provider)
}

/// Open the configured record store
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db: Arc<dyn Database> = match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Arc::new(MemoryDatabase::new())
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres store")?;
            let pool = create_pool(url, config.db_max_connections).await?;
            if config.run_migrations {
                run_migrations(&pool).await?;
            }
            Arc::new(PgDatabase::new(pool))
        }
    };

    Ok(AppState::new(db))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/organizations",
            get(list_organizations_handler)
                .post(create_organization_handler)
                .delete(delete_organization_handler),
        )
        .route(
            "/organizations/{organization_id}",
            get(get_organization_handler).put(update_organization_handler),
        )
        .route(
            "/organizations/{organization_id}/distance-to-storage/{storage_id}",
            get(distance_to_storage_handler),
        )
        .route(
            "/organizations/{organization_id}/available-storages",
            get(available_storages_handler),
        )
        .route(
            "/organizations/{organization_id}/storages/{storage_id}/transfer-waste",
            post(transfer_waste_handler),
        )
        .route(
            "/organizations/{organization_id}/generate_waste",
            get(generate_waste_handler),
        )
        .route("/storages", get(list_storages_handler).post(create_storage_handler))
        .route(
            "/storages/{storage_id}",
            get(get_storage_handler)
                .put(update_storage_handler)
                .delete(delete_storage_handler),
        )
        .route("/prices", get(prices_by_ticker_handler).post(record_price_handler))
        .route("/prices/latest", get(latest_price_handler))
        .route("/prices/history", get(price_history_handler))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Router that ignores trailing slashes, so `/organizations/` and `/organizations` match alike
pub fn create_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        return;
    }
    info!("Shutting down gracefully...");
}

pub async fn run_server() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting waste router server");

    let config = Config::from_env()?;
    let state = build_state(&config).await?;
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
