//! Error path integration tests
//!
//! - Invalid JSON bodies are rejected before any upstream call
//! - Upstream non-success statuses become 502 with the upstream's answer
//! - Malformed upstream lines are skipped, not fatal

use axum::http::StatusCode;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{sse_payloads, test_config, test_server};
use crate::mocks::MockUpstream;

#[tokio::test]
async fn test_invalid_json_returns_400() {
    let upstream = MockUpstream::start().await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{not json"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_JSON");
    assert!(upstream.requests().await.is_empty());
}

#[tokio::test]
async fn test_upstream_status_becomes_502() {
    let upstream = MockUpstream::start().await;
    upstream.mock_status(401, "token expired").await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({"messages": [{"role": "user", "content": "hi"}]}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"]["details"]["upstream_status"], 401);
    assert_eq!(body["error"]["details"]["upstream_body"], "token expired");
}

#[tokio::test]
async fn test_streaming_request_upstream_status_is_json_502() {
    let upstream = MockUpstream::start().await;
    upstream.mock_status(500, "boom").await;
    let server = test_server(test_config("kilo", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({"stream": true, "messages": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["error"]["details"]["upstream_status"], 500);
}

#[tokio::test]
async fn test_unreachable_upstream_is_502() {
    let server = test_server(test_config("codex", "http://127.0.0.1:9/closed", &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({"messages": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_malformed_upstream_lines_are_skipped() {
    let upstream = MockUpstream::start().await;
    upstream
        .mock_sse(
            ": keep-alive\n\n\
             data: {broken\n\n\
             data: {\"type\":\"response.output_text.delta\",\"delta\":\"fine\"}\n\n\
             data: [DONE]\n\n"
                .to_string(),
        )
        .await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    let buffered = server
        .post("/v1/chat/completions")
        .json(&json!({"messages": []}))
        .await;
    assert_eq!(
        buffered.json::<Value>()["choices"][0]["message"]["content"],
        "fine"
    );

    let streamed = server
        .post("/v1/chat/completions")
        .json(&json!({"stream": true, "messages": []}))
        .await;
    let frames = sse_payloads(&streamed.text());
    let texts: Vec<&str> = frames
        .iter()
        .filter_map(|f| f["choices"][0]["delta"]["content"].as_str())
        .collect();
    assert_eq!(texts, vec!["", "fine"]);
    assert_eq!(frames.last(), Some(&Value::String("[DONE]".to_string())));
}
