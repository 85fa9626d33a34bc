//! Translation between the client dialect and upstream wire formats
//!
//! Inbound bodies are normalized into the canonical model, then a
//! [`WireAdapter`] renders that model into the body the configured upstream
//! expects. Adapters are total: every canonical request has a wire body.

pub mod chat;
pub mod normalize;
pub mod responses;

use std::sync::Arc;

use serde_json::Value;

use crate::canonical::CanonicalRequest;
use crate::config::Provider;

pub use chat::ChatAdapter;
pub use normalize::{normalize, ModelResolution, NormalizeSettings, DEFAULT_MODEL};
pub use responses::ResponsesAdapter;

/// Wire dialect an upstream speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// OpenAI Responses API (`input[]` + `instructions`, typed events)
    Responses,
    /// Chat Completions (`messages[]`, `chat.completion.chunk` deltas)
    Chat,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Responses => "responses",
            AdapterKind::Chat => "chat",
        }
    }
}

/// Renders a canonical request into an upstream request body
pub trait WireAdapter: Send + Sync {
    /// Dialect of the produced body and of the stream that answers it
    fn kind(&self) -> AdapterKind;

    /// Build the outbound JSON body
    fn to_wire_body(&self, request: &CanonicalRequest) -> Value;
}

/// Adapter for a provider profile
pub fn adapter_for(provider: Provider) -> Arc<dyn WireAdapter> {
    match provider {
        Provider::Codex => Arc::new(ResponsesAdapter),
        Provider::Kilo => Arc::new(ChatAdapter::kilo()),
        Provider::Copilot => Arc::new(ChatAdapter::copilot()),
    }
}
