//! Response encoding for the client-facing chat dialect
//!
//! Renders a reconstructed [`CanonicalResponse`] as a single chat completion
//! document, and provides the chunk builders and SSE framing the streaming
//! paths share.

use bytes::Bytes;
use serde::Serialize;
use tracing::error;

use super::response::{
    CanonicalResponse, ChatCompletionResponse, Choice, ChoiceMessage, Delta, StreamChoice,
    StreamChunk, ToolCall, ToolCallDelta, ToolCallFunctionDelta, ToolCallRecord, Usage,
};

/// Finish reason reported on every completed response
pub const FINISH_REASON: &str = "stop";

/// Identity of one client-visible response.
///
/// Generated once per exchange so every chunk, and every re-encoding of the
/// same accumulated state, carries the same id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub id: String,
    pub created: u64,
    pub model: String,
}

impl ResponseMeta {
    /// Fresh identity for a response from `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            created: chrono::Utc::now().timestamp().max(0) as u64,
            model: model.into(),
        }
    }
}

/// Encode a reconstructed response as a chat completion document.
///
/// `tool_calls` is only present when the upstream produced any; usage is zero
/// when the upstream never reported it.
pub fn encode(response: &CanonicalResponse, meta: &ResponseMeta) -> ChatCompletionResponse {
    let tool_calls = if response.tool_calls.is_empty() {
        None
    } else {
        Some(response.tool_calls.iter().map(ToolCall::from).collect())
    };

    ChatCompletionResponse {
        id: meta.id.clone(),
        object: "chat.completion".to_string(),
        created: meta.created,
        model: meta.model.clone(),
        choices: vec![Choice {
            index: 0,
            message: ChoiceMessage {
                role: response.role.clone(),
                content: response.text.clone(),
                tool_calls,
            },
            finish_reason: FINISH_REASON.to_string(),
        }],
        usage: response.usage,
    }
}

fn chunk(
    meta: &ResponseMeta,
    delta: Delta,
    finish_reason: Option<String>,
    usage: Option<Usage>,
) -> StreamChunk {
    StreamChunk {
        id: meta.id.clone(),
        object: "chat.completion.chunk".to_string(),
        created: meta.created,
        model: meta.model.clone(),
        choices: vec![StreamChoice {
            index: 0,
            delta,
            finish_reason,
        }],
        usage,
    }
}

/// First chunk of a stream, announcing the role
pub fn role_chunk(meta: &ResponseMeta, role: &str) -> StreamChunk {
    chunk(
        meta,
        Delta {
            role: Some(role.to_string()),
            content: Some(String::new()),
            tool_calls: None,
        },
        None,
        None,
    )
}

/// Content fragment chunk
pub fn text_chunk(meta: &ResponseMeta, text: &str) -> StreamChunk {
    chunk(
        meta,
        Delta {
            content: Some(text.to_string()),
            ..Default::default()
        },
        None,
        None,
    )
}

/// A complete tool call delivered as one delta at position `index`
pub fn tool_call_chunk(meta: &ResponseMeta, index: u32, record: &ToolCallRecord) -> StreamChunk {
    chunk(
        meta,
        Delta {
            tool_calls: Some(vec![ToolCallDelta {
                index,
                id: Some(record.id.clone()),
                call_type: Some("function".to_string()),
                function: Some(ToolCallFunctionDelta {
                    name: Some(record.name.clone()),
                    arguments: Some(record.arguments.clone()),
                }),
            }]),
            ..Default::default()
        },
        None,
        None,
    )
}

/// Final chunk carrying the finish reason and usage
pub fn finish_chunk(meta: &ResponseMeta, usage: Usage) -> StreamChunk {
    chunk(
        meta,
        Delta::default(),
        Some(FINISH_REASON.to_string()),
        Some(usage),
    )
}

/// Format a serializable value as an SSE data event: `data: {json}\n\n`
pub fn format_sse_json<T: Serialize>(value: &T) -> Bytes {
    match serde_json::to_string(value) {
        Ok(json) => Bytes::from(format!("data: {}\n\n", json)),
        Err(e) => {
            error!(error = %e, "Failed to serialize stream event");
            format_error_event("Failed to serialize stream event", Some("internal_error"))
        }
    }
}

/// Format the SSE done marker: `data: [DONE]\n\n`
pub fn format_sse_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// SSE error event structure for stream errors
#[derive(Debug, Serialize)]
struct SseErrorEvent<'a> {
    error: SseErrorDetails<'a>,
}

#[derive(Debug, Serialize)]
struct SseErrorDetails<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    error_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

/// Format an error as an SSE error event.
///
/// Lets clients see why a stream ended before it closes.
pub fn format_error_event(message: &str, code: Option<&str>) -> Bytes {
    let event = SseErrorEvent {
        error: SseErrorDetails {
            message,
            error_type: "stream_error",
            code,
        },
    };
    match serde_json::to_string(&event) {
        Ok(json) => Bytes::from(format!("data: {}\n\n", json)),
        Err(_) => Bytes::from_static(b"data: {\"error\":{\"type\":\"stream_error\"}}\n\n"),
    }
}
