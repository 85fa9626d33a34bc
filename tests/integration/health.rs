//! Health endpoint integration tests
//!
//! Tests for the operational endpoints:
//! - GET /health - Status with version, uptime and provider
//! - GET /health/live - Liveness probe
//! - GET /metrics - Prometheus text

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::{test_config, test_server};
use crate::mocks::{MockUpstream, ResponsesEvents};

#[tokio::test]
async fn test_health_reports_provider() {
    let server = test_server(test_config("kilo", "http://127.0.0.1:9/unused", &[]));

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["provider"], "kilo");
    assert_eq!(body["upstream_url"], "http://127.0.0.1:9/unused");
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_liveness() {
    let server = test_server(test_config("codex", "http://127.0.0.1:9/unused", &[]));

    let response = server.get("/health/live").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_exposes_request_counter() {
    relay::routes::metrics::init_metrics();
    let upstream = MockUpstream::start().await;
    upstream.mock_sse(ResponsesEvents::text(&["ok"], 2, 1)).await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    server
        .post("/v1/chat/completions")
        .json(&serde_json::json!({"messages": []}))
        .await;
    let response = server.get("/metrics").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("relay_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = test_server(test_config("codex", "http://127.0.0.1:9/unused", &[]));

    let response = server.get("/v1/models").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
