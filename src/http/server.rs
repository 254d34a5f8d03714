//! HTTP API Server for Argus
//!
//! Batch scoring of the dashboard metrics and live scoring of the deposit feed.

use crate::{
    api::anomaly_api::{AnomalyApi, BatchRow},
    core::{timestamps, DetectionRecord, Metric},
    stream::live_detector::{LiveAssessment, LiveRecord},
    Error,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Stream fed by `POST /live`.
pub const LIVE_STREAM: &str = "deposits";

/// Request carrying one live observation
#[derive(Debug, Deserialize)]
pub struct LiveRequest {
    pub deposit: f64,
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub history: Option<bool>,
}

/// Response for a live observation
///
/// While the window warms up `status` is set and the band fields are absent.
#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub timestamp: String,
    pub deposit: f64,
    pub anomaly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<DetectionRecord>>,
}

impl LiveResponse {
    fn from_record(record: LiveRecord, include_history: bool) -> Self {
        let mut response = LiveResponse {
            timestamp: timestamps::format(&record.timestamp),
            deposit: record.value,
            anomaly: record.anomaly,
            mean: None,
            upper: None,
            lower: None,
            status: None,
            history: None,
        };
        match record.assessment {
            LiveAssessment::InsufficientData { buffered, required } => {
                response.status =
                    Some(format!("insufficient data ({} of {} samples)", buffered, required));
            }
            LiveAssessment::Scored { band, history } => {
                response.mean = Some(band.mean.unwrap_or(0.0));
                response.upper = Some(band.upper().unwrap_or(0.0));
                response.lower = Some(band.lower().unwrap_or(0.0));
                response.history = include_history.then_some(history);
            }
        }
        response
    }
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shared application state
pub struct AppState {
    pub api: Arc<AnomalyApi>,
}

/// Custom error type for API errors
pub enum ApiError {
    ArgusError(Error),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ArgusError(e @ Error::InvalidParameter(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::ArgusError(e @ Error::UnknownStream(_)) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            ApiError::ArgusError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::ArgusError(err)
    }
}

/// Create the HTTP server with all routes
pub fn create_server(api: Arc<AnomalyApi>) -> Router {
    let state = Arc::new(AppState { api });

    // The dashboard is served from another origin.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/data", get(batch_data))
        .route("/live", post(live_observation).delete(reset_live))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(SuccessResponse {
        message: "Argus HTTP API is running".to_string(),
    })
}

/// GET /data - Score the dashboard metrics
///
/// Accepts `{metric}_spikes`, `{metric}_drops` and `{metric}_contamination`
/// for every dashboard metric.
async fn batch_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<BatchRow>>, ApiError> {
    let metrics = metrics_from_params(&params)?;
    let rows = state.api.score_batch(&metrics)?;
    Ok(Json(rows))
}

/// POST /live - Ingest one deposit and score it against the live window
async fn live_observation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LiveQuery>,
    Json(payload): Json<LiveRequest>,
) -> Result<Json<LiveResponse>, ApiError> {
    let record = state.api.ingest(LIVE_STREAM, payload.deposit)?;
    Ok(Json(LiveResponse::from_record(record, query.history.unwrap_or(true))))
}

/// DELETE /live - Empty the live window
async fn reset_live(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.api.reset_stream(LIVE_STREAM)?;
    Ok(Json(SuccessResponse {
        message: format!("Live stream '{}' reset", LIVE_STREAM),
    }))
}

/// Reads the per-metric query parameters of the dashboard.
pub fn metrics_from_params(params: &HashMap<String, String>) -> Result<Vec<Metric>, ApiError> {
    Metric::default_set()
        .into_iter()
        .map(|metric| -> Result<Metric, ApiError> {
            let spikes = parse_param(params, &format!("{}_spikes", metric.name))?.unwrap_or(1);
            let drops = parse_param(params, &format!("{}_drops", metric.name))?.unwrap_or(1);
            // Absent contamination is estimated from the generated series.
            let contamination = parse_param(params, &format!("{}_contamination", metric.name))?;
            Ok(metric.with_injections(spikes, drops).with_contamination(contamination))
        })
        .collect()
}

fn parse_param<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ApiError> {
    params
        .get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid value for {}: '{}'", key, raw)))
        })
        .transpose()
}

/// Start the HTTP server on the specified address
pub async fn start_server(
    addr: &str,
    api: Arc<AnomalyApi>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(api);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Argus HTTP API server listening on http://{}", addr);
    info!("  GET    /data    - Batch scoring of the dashboard metrics");
    info!("  POST   /live    - Ingest and score one deposit");
    info!("  DELETE /live    - Reset the live window");
    info!("  GET    /health  - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
