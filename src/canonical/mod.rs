//! Canonical message model
//!
//! The provider-agnostic representation both directions of the relay pass
//! through: requests are normalized into [`CanonicalRequest`], upstream
//! streams are reduced into [`CanonicalResponse`], and the encoder renders
//! responses back into the chat-completion dialect.

pub mod encode;
pub mod response;
pub mod types;

use std::time::Instant;

pub use encode::{encode, ResponseMeta};
pub use response::{CanonicalResponse, ChatCompletionResponse, StreamChunk, ToolCallRecord, Usage};
pub use types::{
    CanonicalMessage, CanonicalRequest, ChatPassthrough, ContentPart, ReasoningConfig,
    ReasoningEffort, ReasoningSummary, Role, Tool, ToolChoice, ToolSpec, DEFAULT_INSTRUCTIONS,
};

use crate::translate::AdapterKind;

/// Per-request correlation state.
///
/// Created once the request is normalized and carried through to encoding, so
/// nothing request-scoped ever lives on shared objects.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Whether the client asked for a streamed response
    pub stream: bool,
    /// Resolved upstream model
    pub model: String,
    /// Wire dialect spoken with the upstream
    pub adapter: AdapterKind,
    pub started: Instant,
    /// Identity shared by every frame or document sent back to the client
    pub meta: ResponseMeta,
}

impl Exchange {
    pub fn begin(request: &CanonicalRequest, adapter: AdapterKind) -> Self {
        Self {
            stream: request.stream,
            model: request.model.clone(),
            adapter,
            started: Instant::now(),
            meta: ResponseMeta::new(request.model.clone()),
        }
    }

    /// Seconds since the exchange began
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
