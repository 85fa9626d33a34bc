//! Outbound header integration tests
//!
//! Checks the headers the upstream actually receives for each provider,
//! including authorization stripping, override files and credentials.

use axum::http::{HeaderName, HeaderValue};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Request;

use crate::common::{constants, temp_file, test_config, test_server};
use crate::mocks::{sse_body, ChatChunks, MockUpstream, ResponsesEvents};

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

fn auth() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_static(constants::CLIENT_TOKEN),
    )
}

#[tokio::test]
async fn test_codex_strips_client_authorization() {
    let upstream = MockUpstream::start().await;
    upstream.mock_sse(ResponsesEvents::text(&["ok"], 1, 1)).await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));
    let (name, value) = auth();

    server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-client-trace"),
            HeaderValue::from_static("trace-1"),
        )
        .json(&json!({"messages": [{"role": "user", "content": "hi"}]}))
        .await;

    let request = upstream.only_request().await;
    assert!(header(&request, "authorization").is_none());
    assert_eq!(header(&request, "x-client-trace"), Some("trace-1"));
    assert_eq!(header(&request, "accept"), Some("text/event-stream"));
    assert_eq!(header(&request, "content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_strip_disabled_forwards_client_authorization() {
    let upstream = MockUpstream::start().await;
    upstream.mock_sse(ResponsesEvents::text(&["ok"], 1, 1)).await;
    let server = test_server(test_config(
        "codex",
        &upstream.url(),
        &[("STRIP_AUTHORIZATION", "false")],
    ));
    let (name, value) = auth();

    server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&json!({"messages": []}))
        .await;

    let request = upstream.only_request().await;
    assert_eq!(header(&request, "authorization"), Some(constants::CLIENT_TOKEN));
}

#[tokio::test]
async fn test_override_file_applies_last() {
    let upstream = MockUpstream::start().await;
    upstream.mock_sse(ResponsesEvents::text(&["ok"], 1, 1)).await;
    let overrides = temp_file(
        "headers",
        r#"{"Authorization": "Bearer injected", "X-Retry": 3, "User-Agent": null, "Accept": "application/json"}"#,
    );
    let server = test_server(test_config(
        "codex",
        &upstream.url(),
        &[("HEADERS_FILE", overrides.to_str().unwrap())],
    ));
    let (name, value) = auth();

    server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("user-agent"),
            HeaderValue::from_static("curl/8.0"),
        )
        .json(&json!({"messages": []}))
        .await;

    let request = upstream.only_request().await;
    assert_eq!(header(&request, "authorization"), Some("Bearer injected"));
    assert_eq!(header(&request, "x-retry"), Some("3"));
    assert_eq!(header(&request, "accept"), Some("application/json"));
    assert!(header(&request, "user-agent").is_none());

    std::fs::remove_file(overrides).ok();
}

#[tokio::test]
async fn test_kilo_profile_headers_and_key() {
    let upstream = MockUpstream::start().await;
    upstream.mock_sse(sse_body(&[ChatChunks::content("ok")])).await;
    let server = test_server(test_config(
        "kilo",
        &upstream.url(),
        &[
            ("KILO_API_KEY", constants::TEST_KILO_API_KEY),
            ("KILO_PROJECT_ID", "proj_config"),
        ],
    ));
    let (name, value) = auth();

    server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&json!({
            "messages": [{"role": "user", "content": "hi"}],
            "organization_id": "org_request"
        }))
        .await;

    let request = upstream.only_request().await;
    assert_eq!(
        header(&request, "authorization"),
        Some(format!("Bearer {}", constants::TEST_KILO_API_KEY).as_str())
    );
    assert_eq!(header(&request, "x-title"), Some("Kilo Code"));
    assert_eq!(header(&request, "x-kilocode-version"), Some("5.1.0"));
    assert_eq!(header(&request, "user-agent"), Some("Kilo-Code/5.1.0"));
    assert_eq!(header(&request, "x-kilocode-organizationid"), Some("org_request"));
    assert_eq!(header(&request, "x-kilocode-projectid"), Some("proj_config"));
    assert!(header(&request, "x-kilocode-taskid").is_some());
}

#[tokio::test]
async fn test_copilot_api_key_fallback_and_agent_initiator() {
    let upstream = MockUpstream::start().await;
    upstream.mock_sse(sse_body(&[ChatChunks::content("ok")])).await;
    let server = test_server(test_config(
        "copilot",
        &upstream.url(),
        &[("COPILOT_API_KEY", constants::TEST_COPILOT_API_KEY)],
    ));

    server
        .post("/v1/chat/completions")
        .json(&json!({"messages": [
            {"role": "user", "content": [
                {"type": "text", "text": "what is this"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ]},
            {"role": "assistant", "content": "a cat"},
            {"role": "user", "content": "are you sure?"}
        ]}))
        .await;

    let request = upstream.only_request().await;
    assert_eq!(
        header(&request, "authorization"),
        Some(format!("Bearer {}", constants::TEST_COPILOT_API_KEY).as_str())
    );
    assert_eq!(header(&request, "copilot-integration-id"), Some("vscode-chat"));
    assert_eq!(header(&request, "x-initiator"), Some("agent"));
    assert_eq!(header(&request, "copilot-vision-request"), Some("true"));
    assert!(header(&request, "x-request-id").is_some());
}

#[tokio::test]
async fn test_copilot_token_store_endpoint_overrides_upstream_url() {
    let upstream = MockUpstream::start().await;
    upstream.mock_sse(sse_body(&[ChatChunks::content("ok")])).await;
    let expires_at = chrono::Utc::now().timestamp() + 3600;
    let tokens = temp_file(
        "tokens",
        &json!({
            "githubToken": "gho_test",
            "copilotToken": "tid_fresh",
            "endpoint": upstream.url(),
            "expiresAt": expires_at
        })
        .to_string(),
    );
    let server = test_server(test_config(
        "copilot",
        "http://127.0.0.1:9/unused",
        &[("COPILOT_TOKEN_FILE", tokens.to_str().unwrap())],
    ));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({"messages": [{"role": "user", "content": "hi"}]}))
        .await;

    assert_eq!(response.json::<serde_json::Value>()["choices"][0]["message"]["content"], "ok");
    let request = upstream.only_request().await;
    assert_eq!(header(&request, "authorization"), Some("Bearer tid_fresh"));
    assert_eq!(header(&request, "x-initiator"), Some("user"));
    assert!(header(&request, "copilot-vision-request").is_none());

    std::fs::remove_file(tokens).ok();
}
