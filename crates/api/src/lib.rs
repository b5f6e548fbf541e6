//! Apprentice Status Prediction API Server
//!
//! HTTP surface for the apprentice status predictor: form description,
//! prediction, health and Prometheus metrics.

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use feature_engine::ColumnDefault;
use inference_engine::{ArtifactCache, Classifier};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;
pub mod service;

pub use crate::config::{AppConfig, LogFormat, LoggingConfig};
pub use error::{ErrorResponse, ServiceError};
pub use routes::form::{FormControl, FormDescription};
pub use routes::predictions::PredictionResponse;
pub use service::{PredictionOutcome, PredictionService};

use rate_limit::{create_governor_config, RateLimitConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Prediction pipeline
    pub service: PredictionService,
    /// Prometheus exporter handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(service: PredictionService, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            service,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelSummary,
    pub dataset: DatasetSummary,
}

/// Loaded classifier summary
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub kind: String,
    pub n_features: usize,
    pub labels: Vec<String>,
}

/// Reference dataset summary
#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub target_column: String,
    pub rows: usize,
    pub feature_columns: usize,
    pub mapped_inputs: usize,
    /// Default-value summary (mean, spread, range) per feature column
    pub columns: Vec<ColumnDefault>,
}

/// Create the application router
pub fn create_router(
    state: Arc<AppState>,
    rate_limit: &RateLimitConfig,
) -> Result<Router, ServiceError> {
    let predict_route = match create_governor_config(rate_limit).map_err(ServiceError::Config)? {
        Some(config) => post(routes::predictions::predict).layer(GovernorLayer { config }),
        None => post(routes::predictions::predict),
    };

    Ok(Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/form", get(routes::form::get_form))
        .route("/api/v1/predict", predict_route)
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let artifact = state.service.engine().artifact();
    let reconstructor = state.service.reconstructor();

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: ModelSummary {
            kind: artifact.classifier.kind().to_string(),
            n_features: artifact.classifier.n_features(),
            labels: artifact.labels.labels().map(|(_, l)| l.to_string()).collect(),
        },
        dataset: DatasetSummary {
            target_column: reconstructor.target_column().to_string(),
            rows: state.service.reference_rows(),
            feature_columns: reconstructor.defaults().len(),
            mapped_inputs: reconstructor.mapping().len(),
            columns: reconstructor.defaults().iter().cloned().collect(),
        },
    };

    Json(response)
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true);
    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Run the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let service = PredictionService::load(&config, ArtifactCache::global())
        .context("failed to prepare prediction service")?;

    let metrics = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    let state = Arc::new(AppState::new(service, metrics));
    let app = create_router(state, &config.rate_limit)?;

    info!("Starting API server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
