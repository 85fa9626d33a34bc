//! Mock upstream provider for testing
//!
//! Wraps a wiremock server that answers the relay's upstream POST with a
//! canned SSE body, in either the Responses or the Chat Completions dialect.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::mocks::upstream::{MockUpstream, ResponsesEvents};
//!
//! #[tokio::test]
//! async fn test_with_upstream_mock() {
//!     let upstream = MockUpstream::start().await;
//!     upstream.mock_sse(ResponsesEvents::text(&["Hel", "lo"], 5, 2)).await;
//!
//!     // Use upstream.url() as UPSTREAM_URL
//! }
//! ```

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Path the relay is pointed at
pub const UPSTREAM_PATH: &str = "/v1/upstream";

/// Mock upstream server wrapper
pub struct MockUpstream {
    server: MockServer,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full upstream URL for `UPSTREAM_URL`
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), UPSTREAM_PATH)
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Answer with an SSE body
    pub async fn mock_sse(&self, body: String) {
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "text/event-stream"),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer with an error status and plain body
    pub async fn mock_status(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(UPSTREAM_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Every request the upstream has received so far
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// The single request the upstream received
    pub async fn only_request(&self) -> Request {
        let mut requests = self.requests().await;
        assert_eq!(requests.len(), 1, "expected exactly one upstream request");
        requests.remove(0)
    }
}

/// Frame a list of JSON events as an SSE body terminated by `[DONE]`
pub fn sse_body(events: &[Value]) -> String {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("data: {}\n\n", event));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// Responses API event builders
pub struct ResponsesEvents;

impl ResponsesEvents {
    pub fn text_delta(delta: &str) -> Value {
        json!({"type": "response.output_text.delta", "delta": delta})
    }

    pub fn completed(input: u64, output: u64) -> Value {
        json!({
            "type": "response.completed",
            "response": {
                "id": "resp_mock",
                "usage": {
                    "input_tokens": input,
                    "output_tokens": output,
                    "total_tokens": input + output
                }
            }
        })
    }

    pub fn function_call(call_id: &str, name: &str, arguments: &str) -> Value {
        json!({
            "type": "response.output_item.done",
            "item": {
                "type": "function_call",
                "id": format!("fc_{}", call_id),
                "call_id": call_id,
                "name": name,
                "arguments": arguments
            }
        })
    }

    /// Text deltas followed by a completion carrying usage
    pub fn text(deltas: &[&str], input: u64, output: u64) -> String {
        let mut events: Vec<Value> = deltas.iter().map(|d| Self::text_delta(d)).collect();
        events.push(Self::completed(input, output));
        sse_body(&events)
    }
}

/// Chat Completions chunk builders
pub struct ChatChunks;

impl ChatChunks {
    pub fn content(content: &str) -> Value {
        json!({
            "id": "chatcmpl-upstream",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
    }

    pub fn role(role: &str) -> Value {
        json!({
            "id": "chatcmpl-upstream",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"role": role, "content": ""}, "finish_reason": null}]
        })
    }

    pub fn usage(prompt: u64, completion: u64) -> Value {
        json!({
            "id": "chatcmpl-upstream",
            "object": "chat.completion.chunk",
            "choices": [],
            "usage": {
                "prompt_tokens": prompt,
                "completion_tokens": completion,
                "total_tokens": prompt + completion
            }
        })
    }
}
