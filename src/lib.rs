//! Relay - LLM dialect relay
//!
//! Accepts OpenAI chat-completion requests, rewrites them for a Responses or
//! Chat Completions upstream, and rebuilds the upstream's SSE stream into the
//! chat dialect the client expects.

pub mod canonical;
pub mod config;
pub mod error;
pub mod proxy;
pub mod routes;
pub mod streaming;
pub mod translate;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::{Config, Provider};
pub use crate::proxy::{CredentialSource, UpstreamClient};
pub use crate::translate::{NormalizeSettings, WireAdapter};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    pub upstream: UpstreamClient,
    /// Wire dialect for the configured provider
    pub adapter: Arc<dyn WireAdapter>,
    /// Bearer token source; `None` forwards only what header synthesis yields
    pub credentials: Option<Arc<dyn CredentialSource>>,
    pub normalize: NormalizeSettings,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        let upstream = UpstreamClient::new(&config)?;

        let credentials: Option<Arc<dyn CredentialSource>> = match config.provider {
            Provider::Codex => None,
            Provider::Kilo => config
                .kilo_api_key
                .clone()
                .map(|key| {
                    Arc::new(proxy::StaticCredential::new(key)) as Arc<dyn CredentialSource>
                }),
            Provider::Copilot => Some(Arc::new(proxy::TokenStore::new(
                config.copilot_token_file.clone(),
                upstream.http().clone(),
                config.copilot_token_url.clone(),
            ))),
        };

        let normalize = NormalizeSettings {
            reasoning: config.reasoning,
            models: config.provider.model_resolution(),
        };

        Ok(Self {
            adapter: translate::adapter_for(config.provider),
            config,
            start_time: Instant::now(),
            upstream,
            credentials,
            normalize,
        })
    }
}
