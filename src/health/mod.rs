/*!
 * # Health Module
 *
 * Informational probes only; no forecasting logic runs here.
 *
 * - Service status (`/`) - running banner plus whether the data-source
 *   configuration value is present
 * - Liveness (`/health/live`) - process is alive, with uptime
 * - Readiness (`/health/ready`) - configuration presence
 *
 * A missing data-source URL is reported here but never fails startup; it
 * only surfaces as an error when a forecast is actually requested.
 */

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::time::{Duration, SystemTime};
use tracing::info;

use crate::AppState;

/// Service status probe
pub async fn service_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("Status endpoint called");

    Json(json!({
        "message": "Demand forecasting service is running!",
        "db_url_status": state.config.db_url_status(),
    }))
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime_seconds = SystemTime::now()
        .duration_since(state.start_time)
        .unwrap_or(Duration::from_secs(0))
        .as_secs();

    Json(json!({
        "alive": true,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime_seconds,
    }))
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ready": true,
        "db_url_status": state.config.db_url_status(),
    }))
}

/// Creates router with health check endpoints
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
}
