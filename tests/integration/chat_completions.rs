//! Chat completions endpoint integration tests
//!
//! Tests for relaying `POST /v1/chat/completions` and `POST /v1/completions`:
//! - Responses upstream, buffered and transcoded
//! - Chat upstream, buffered and passed through
//! - Wire body shape per provider

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{sse_payloads, test_config, test_server};
use crate::mocks::{sse_body, ChatChunks, MockUpstream, ResponsesEvents};

#[tokio::test]
async fn test_codex_buffered_reconstructs_text_and_usage() {
    let upstream = MockUpstream::start().await;
    upstream
        .mock_sse(ResponsesEvents::text(&["Hel", "lo"], 5, 2))
        .await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({
            "model": "gpt-5",
            "messages": [
                {"role": "system", "content": "Be terse."},
                {"role": "user", "content": "hi"}
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "gpt-5.2-codex");
    assert!(body["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert!(body["choices"][0]["message"].get("tool_calls").is_none());
    assert_eq!(
        body["usage"],
        json!({"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7})
    );

    let sent: Value = upstream.only_request().await.body_json().unwrap();
    assert_eq!(sent["model"], "gpt-5.2-codex");
    assert_eq!(sent["instructions"], "Be terse.");
    assert_eq!(sent["stream"], true);
    assert_eq!(sent["store"], false);
    assert_eq!(sent["input"].as_array().unwrap().len(), 1);
    assert_eq!(sent["input"][0]["role"], "user");
}

#[tokio::test]
async fn test_codex_buffered_tool_call_arguments_verbatim() {
    let upstream = MockUpstream::start().await;
    let arguments = r#"{"city": "Paris",  "unit":"c"}"#;
    upstream
        .mock_sse(sse_body(&[
            ResponsesEvents::function_call("call_1", "weather", arguments),
            ResponsesEvents::completed(3, 4),
        ]))
        .await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({
            "messages": [{"role": "user", "content": "weather?"}],
            "tools": [{"type": "function", "function": {"name": "weather", "parameters": {}}}]
        }))
        .await;

    let body: Value = response.json();
    let calls = body["choices"][0]["message"]["tool_calls"].as_array().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["id"], "call_1");
    assert_eq!(calls[0]["type"], "function");
    assert_eq!(calls[0]["function"]["name"], "weather");
    assert_eq!(calls[0]["function"]["arguments"], arguments);
    assert_eq!(body["choices"][0]["message"]["content"], "");
}

#[tokio::test]
async fn test_codex_streaming_transcodes_events() {
    let upstream = MockUpstream::start().await;
    upstream
        .mock_sse(ResponsesEvents::text(&["Hel", "lo"], 5, 2))
        .await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({
            "model": "gpt-5.2-codex",
            "stream": true,
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "text/event-stream");
    assert_eq!(response.header("cache-control"), "no-cache");
    assert_eq!(response.header("x-accel-buffering"), "no");

    let frames = sse_payloads(&response.text());
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0]["choices"][0]["delta"]["role"], "assistant");
    assert_eq!(frames[1]["choices"][0]["delta"]["content"], "Hel");
    assert_eq!(frames[2]["choices"][0]["delta"]["content"], "lo");
    assert_eq!(frames[3]["choices"][0]["finish_reason"], "stop");
    assert_eq!(frames[3]["usage"]["total_tokens"], 7);
    assert_eq!(frames[4], Value::String("[DONE]".to_string()));

    let id = frames[0]["id"].as_str().unwrap();
    assert!(frames[..4].iter().all(|f| f["id"] == id));
    assert!(frames[..4]
        .iter()
        .all(|f| f["object"] == "chat.completion.chunk"));
}

#[tokio::test]
async fn test_legacy_completions_endpoint_answers_in_chat_dialect() {
    let upstream = MockUpstream::start().await;
    upstream
        .mock_sse(ResponsesEvents::text(&["42"], 1, 1))
        .await;
    let server = test_server(test_config("codex", &upstream.url(), &[]));

    let response = server
        .post("/v1/completions")
        .json(&json!({"prompt": "The answer is", "suffix": "."}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["content"], "42");

    let sent: Value = upstream.only_request().await.body_json().unwrap();
    let input = sent["input"].as_array().unwrap();
    assert_eq!(input[0]["role"], "user");
    assert_eq!(input[0]["content"][0]["text"], "The answer is");
}

#[tokio::test]
async fn test_kilo_buffered_chat_upstream() {
    let upstream = MockUpstream::start().await;
    upstream
        .mock_sse(sse_body(&[
            ChatChunks::role("assistant"),
            ChatChunks::content("Bon"),
            ChatChunks::content("jour"),
            ChatChunks::usage(10, 4),
        ]))
        .await;
    let server = test_server(test_config("kilo", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({
            "model": "anthropic/claude-sonnet-4",
            "messages": [{"role": "user", "content": "hello"}]
        }))
        .await;

    let body: Value = response.json();
    assert_eq!(body["model"], "anthropic/claude-sonnet-4");
    assert_eq!(body["choices"][0]["message"]["content"], "Bonjour");
    assert_eq!(body["usage"]["total_tokens"], 14);

    let sent: Value = upstream.only_request().await.body_json().unwrap();
    assert_eq!(sent["model"], "anthropic/claude-sonnet-4");
    assert_eq!(sent["messages"], json!([{"role": "user", "content": "hello"}]));
    assert_eq!(sent["max_tokens"], 4096);
    assert_eq!(sent["temperature"], 0);
    assert_eq!(sent["stream"], true);
    assert!(sent.get("tools").is_none());
}

#[tokio::test]
async fn test_kilo_streaming_passthrough_normalizes_chunks() {
    let upstream = MockUpstream::start().await;
    upstream
        .mock_sse(sse_body(&[
            json!({"id": "up_1", "choices": [{"index": 0, "delta": {"content": "Hi"}}]}),
            json!({"id": "up_1", "choices": [{"index": 0, "delta": {"tool_calls": [
                {"id": "call_9", "function": {"name": "lookup", "arguments": "{}"}}
            ]}}]}),
        ]))
        .await;
    let server = test_server(test_config("kilo", &upstream.url(), &[]));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({"stream": true, "messages": [{"role": "user", "content": "hi"}]}))
        .await;

    assert_eq!(response.header("content-type"), "text/event-stream");
    let frames = sse_payloads(&response.text());
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0]["id"], "up_1");
    assert_eq!(frames[0]["object"], "chat.completion.chunk");
    assert_eq!(frames[0]["choices"][0]["delta"]["content"], "Hi");

    let call = &frames[1]["choices"][0]["delta"]["tool_calls"][0];
    assert_eq!(call["index"], 0);
    assert_eq!(call["type"], "function");
    assert_eq!(call["id"], "call_9");
    assert_eq!(call["function"]["name"], "lookup");
    assert_eq!(frames[2], Value::String("[DONE]".to_string()));
}

#[tokio::test]
async fn test_copilot_forwards_sampling_and_last_listed_model() {
    let upstream = MockUpstream::start().await;
    upstream
        .mock_sse(sse_body(&[ChatChunks::content("ok")]))
        .await;
    let server = test_server(test_config("copilot", &upstream.url(), &[]));

    server
        .post("/v1/chat/completions")
        .json(&json!({
            "model": "gpt-4o, claude-sonnet-4",
            "temperature": 0.3,
            "top_p": 0.9,
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .await;

    let sent: Value = upstream.only_request().await.body_json().unwrap();
    assert_eq!(sent["model"], "claude-sonnet-4");
    assert_eq!(sent["temperature"], 0.3);
    assert_eq!(sent["top_p"], 0.9);
    assert!(sent.get("max_tokens").is_none());
}
