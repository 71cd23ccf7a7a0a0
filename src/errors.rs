use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// Wire shape for every failure outcome.
///
/// Clients distinguish "fix your input" from "service-side problem" via the
/// HTTP status code; the body always carries a single `error` message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request payload lacked a usable `product_id`.
    #[error("product_id is required")]
    MissingProductId,

    /// The historical data store could not be reached or the query failed.
    #[error("Database connection failed")]
    DataSourceUnavailable,

    /// Fewer distinct sale-days than the model needs to fit.
    #[error("Not enough sales data to generate a forecast. Please log at least {0} different days of sales.")]
    InsufficientHistory(usize),

    /// The fitting procedure failed (e.g. degenerate or non-finite estimates).
    #[error("Model fitting failed: {0}")]
    ModelFitFailed(String),

    /// The projected output violated the horizon-length or ordering invariant.
    #[error("Forecast output malformed: {0}")]
    ForecastShapeMismatch(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("An internal error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingProductId | Self::InsufficientHistory(_) => StatusCode::BAD_REQUEST,
            Self::DataSourceUnavailable
            | Self::ModelFitFailed(_)
            | Self::ForecastShapeMismatch(_)
            | Self::DatabaseError(_)
            | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message placed in the response body.
    ///
    /// Raw database errors are collapsed to the generic connection-failure
    /// message so driver internals never leak to callers.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database connection failed".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.response_message(),
        };
        (status, Json(body)).into_response()
    }
}
