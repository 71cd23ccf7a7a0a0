//! Demand Forecast API Library
//!
//! Forecasts future product demand from historical daily sales: aggregation
//! by calendar day, minimum-data gating, additive trend/seasonality
//! decomposition, and a 30-day projection with uncertainty bounds.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod forecast;
pub mod handlers;
pub mod health;
pub mod queries;

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::SystemTime;

use db::SalesStore;

/// Shared application state. Holds only process-wide configuration and the
/// data-source dependency; nothing here carries per-request or cross-request
/// mutable state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SalesStore>,
    pub config: config::AppConfig,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(store: Arc<dyn SalesStore>, config: config::AppConfig) -> Self {
        Self {
            store,
            config,
            start_time: SystemTime::now(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<axum::Json<T>, errors::ServiceError>;

/// Composes the full application router: status probe, health endpoints, and
/// the forecasting pipeline.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::service_status))
        .nest("/health", health::health_routes())
        .merge(handlers::forecast::forecast_routes())
        .with_state(state)
}
