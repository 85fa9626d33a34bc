//! Chat completions endpoint
//!
//! Accepts OpenAI chat-completion (and legacy completion) requests, relays
//! them to the configured upstream and answers in the chat-completion dialect,
//! streamed or buffered as the client asked.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    canonical::{encode, Exchange},
    error::AppError,
    proxy::{prepare, ByteStream},
    routes::metrics::{record_request, record_tokens},
    streaming,
    translate::{normalize, AdapterKind},
    AppState,
};

/// Handle chat completion requests
///
/// Also mounted at `/v1/completions`; a `prompt` field selects legacy input.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let raw: Value = serde_json::from_slice(&body)?;

    let request = normalize(&raw, &state.normalize);
    let exchange = Exchange::begin(&request, state.adapter.kind());

    info!(
        model = %exchange.model,
        stream = %exchange.stream,
        messages = request.messages.len(),
        tools = request.tools.len(),
        adapter = exchange.adapter.as_str(),
        "Processing chat completion request"
    );

    let wire_body = state.adapter.to_wire_body(&request);
    let target = prepare(
        &state.config,
        state.credentials.as_deref(),
        &request,
        &headers,
    )
    .await;

    let upstream = match state.upstream.send(&target.url, &wire_body, target.headers).await {
        Ok(upstream) => upstream,
        Err(e) => {
            record_request("error", &exchange.model, exchange.elapsed_secs());
            return Err(e);
        }
    };

    if exchange.stream {
        stream_response(upstream, exchange)
    } else {
        buffered_response(upstream, exchange).await
    }
}

/// Reduce the upstream stream and answer with one completion document
async fn buffered_response(upstream: ByteStream, exchange: Exchange) -> Result<Response, AppError> {
    let response = match streaming::reconstruct(upstream).await {
        Ok(response) => response,
        Err(e) => {
            warn!(model = %exchange.model, error = %e, "Upstream stream failed");
            record_request("error", &exchange.model, exchange.elapsed_secs());
            return Err(e.into());
        }
    };

    let duration = exchange.elapsed_secs();
    record_request("success", &exchange.model, duration);
    record_tokens("prompt", response.usage.prompt_tokens, &exchange.model);
    record_tokens("completion", response.usage.completion_tokens, &exchange.model);

    info!(
        model = %exchange.model,
        duration_ms = %format!("{:.2}", duration * 1000.0),
        tool_calls = response.tool_calls.len(),
        total_tokens = response.usage.total_tokens,
        "Chat completion request completed"
    );

    Ok((StatusCode::OK, Json(encode(&response, &exchange.meta))).into_response())
}

/// Relay the upstream as chat-completion SSE frames
fn stream_response(upstream: ByteStream, exchange: Exchange) -> Result<Response, AppError> {
    let body = match exchange.adapter {
        AdapterKind::Responses => {
            Body::from_stream(streaming::transcode(upstream, exchange.meta.clone()))
        }
        AdapterKind::Chat => Body::from_stream(streaming::passthrough(upstream)),
    };

    // Final metrics are not available until the client drains the stream
    record_request("streaming", &exchange.model, exchange.elapsed_secs());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))?;

    info!(
        model = %exchange.model,
        adapter = exchange.adapter.as_str(),
        "Streaming chat completion started"
    );

    Ok(response)
}
