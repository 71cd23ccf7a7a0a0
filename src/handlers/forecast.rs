use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    errors::ServiceError,
    forecast::{check_sufficiency, engine, projector, projector::ForecastRecord},
    AppState,
};

/// Build the forecast Router.
pub fn forecast_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict_demand))
}

/// Inbound payload for "generate forecast for product".
#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Successful forecast outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub message: String,
    pub product_id: String,
    pub forecast: Vec<ForecastRecord>,
}

/// The main forecasting endpoint.
///
/// Pipeline: validate -> fetch daily history -> sufficiency gate -> fit and
/// predict -> project future window -> respond. Every failure maps through
/// `ServiceError`, so callers always get `{ "error": ... }` with a status
/// distinguishing bad input from service-side problems. The store scopes its
/// connection per call, so release happens on every path without handler
/// involvement.
#[instrument(skip(state, payload))]
pub async fn predict_demand(
    State(state): State<AppState>,
    Json(payload): Json<ForecastRequest>,
) -> Result<Json<ForecastResponse>, ServiceError> {
    let product_id = payload
        .product_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ServiceError::MissingProductId)?;

    let history = state.store.fetch_daily_history(product_id).await?;
    info!(
        product_id,
        distinct_days = history.distinct_days(),
        "fetched sales history"
    );

    check_sufficiency(&history, state.config.min_history_days)?;

    let horizon = state.config.forecast_horizon_days;
    let model = engine::fit(&history)?;
    let last_historical_date = model.last_historical_date();
    let points = engine::predict(&model, horizon);
    let forecast = projector::project_future(&points, last_historical_date, horizon)?;

    info!(
        product_id,
        horizon_days = horizon,
        "forecast generated successfully"
    );

    Ok(Json(ForecastResponse {
        message: "Forecast generated successfully".to_string(),
        product_id: product_id.to_string(),
        forecast,
    }))
}
