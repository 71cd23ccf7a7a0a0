//! End-to-end tests for the forecasting pipeline over the HTTP surface,
//! using a stub sales store in place of the historical data store.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use demand_forecast_api::{
    config::AppConfig,
    db::SalesStore,
    errors::ServiceError,
    forecast::{DailyAggregate, HistorySeries},
    AppState,
};

type StoreBehavior =
    dyn Fn(usize, &str) -> Result<HistorySeries, ServiceError> + Send + Sync + 'static;

/// Stub store counting calls; behavior can depend on the call index, which
/// lets tests model a failing store that later recovers.
struct StubStore {
    calls: Arc<AtomicUsize>,
    behavior: Box<StoreBehavior>,
}

#[async_trait]
impl SalesStore for StubStore {
    async fn fetch_daily_history(&self, product_id: &str) -> Result<HistorySeries, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.behavior)(call, product_id)
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://localhost/sales".into()),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "development".into(),
        log_level: "info".into(),
        log_json: false,
        auto_migrate: false,
        forecast_horizon_days: 30,
        min_history_days: 5,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
    }
}

fn app_with_store(
    behavior: impl Fn(usize, &str) -> Result<HistorySeries, ServiceError> + Send + Sync + 'static,
) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = StubStore {
        calls: calls.clone(),
        behavior: Box::new(behavior),
    };
    let state = AppState::new(Arc::new(store), test_config());
    (demand_forecast_api::app(state), calls)
}

fn series(start: &str, values: &[f64]) -> HistorySeries {
    let start: NaiveDate = start.parse().unwrap();
    let entries = values
        .iter()
        .enumerate()
        .map(|(i, &v)| DailyAggregate {
            date: start + chrono::Duration::days(i as i64),
            total_quantity: v,
        })
        .collect();
    HistorySeries::from_ordered_rows(entries).unwrap()
}

async fn post_predict(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn forecast_success_returns_thirty_future_points() {
    let (app, _) = app_with_store(|_, _| {
        Ok(series(
            "2024-01-01",
            &[1.0, 2.0, 3.0, 2.0, 4.0, 3.0, 5.0, 4.0, 6.0, 5.0],
        ))
    });

    let (status, body) = post_predict(app, json!({ "product_id": "prod-42" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Forecast generated successfully");
    assert_eq!(body["product_id"], "prod-42");

    let forecast = body["forecast"].as_array().unwrap();
    assert_eq!(forecast.len(), 30);
    assert_eq!(forecast[0]["date"], "2024-01-11");
    assert_eq!(forecast[29]["date"], "2024-02-09");

    for point in forecast {
        let expected = point["expected"].as_f64().unwrap();
        let lower = point["lower_bound"].as_f64().unwrap();
        let upper = point["upper_bound"].as_f64().unwrap();
        assert!(lower <= expected && expected <= upper);
    }
}

#[tokio::test]
async fn missing_product_id_is_bad_request_with_no_store_access() {
    let (app, calls) = app_with_store(|_, _| Ok(series("2024-01-01", &[1.0; 10])));

    let (status, body) = post_predict(app, json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "product_id is required");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_product_id_is_bad_request_with_no_store_access() {
    let (app, calls) = app_with_store(|_, _| Ok(series("2024-01-01", &[1.0; 10])));

    let (status, body) = post_predict(app, json!({ "product_id": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "product_id is required");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn three_distinct_days_is_rejected_as_insufficient() {
    let (app, _) = app_with_store(|_, _| Ok(series("2024-01-01", &[3.0, 5.0, 4.0])));

    let (status, body) = post_predict(app, json!({ "product_id": "prod-1" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Not enough sales data"));
    assert!(message.contains("at least 5 different days"));
}

#[tokio::test]
async fn store_failure_is_server_error_and_next_request_recovers() {
    // First call: data source down. Second call: healthy history. No broken
    // state may carry over between the two requests.
    let (app, calls) = app_with_store(|call, _| {
        if call == 0 {
            Err(ServiceError::DataSourceUnavailable)
        } else {
            Ok(series("2024-01-01", &[2.0, 3.0, 4.0, 3.0, 5.0, 4.0, 6.0]))
        }
    });

    let (status, body) = post_predict(app.clone(), json!({ "product_id": "prod-1" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database connection failed");

    let (status, body) = post_predict(app, json!({ "product_id": "prod-1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forecast"].as_array().unwrap().len(), 30);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn zero_rows_is_insufficient_not_a_server_error() {
    let (app, _) = app_with_store(|_, _| Ok(HistorySeries::default()));

    let (status, body) = post_predict(app, json!({ "product_id": "ghost" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Not enough sales data"));
}

#[tokio::test]
async fn status_probe_reports_running_and_db_url_presence() {
    let (app, _) = app_with_store(|_, _| Ok(HistorySeries::default()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Demand forecasting service is running!");
    assert_eq!(body["db_url_status"], "loaded");
}

#[tokio::test]
async fn status_probe_reports_missing_db_url() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = StubStore {
        calls,
        behavior: Box::new(|_, _| Ok(HistorySeries::default())),
    };
    let mut config = test_config();
    config.database_url = None;
    let state = AppState::new(Arc::new(store), config);
    let app = demand_forecast_api::app(state);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["db_url_status"], "not found");
}

#[tokio::test]
async fn liveness_and_readiness_probes_respond() {
    let (app, _) = app_with_store(|_, _| Ok(HistorySeries::default()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["alive"], true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["db_url_status"], "loaded");
}
