//! Configuration management for the relay
//!
//! Configuration is loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::canonical::{ReasoningConfig, ReasoningEffort, ReasoningSummary};
use crate::translate::ModelResolution;

/// Default Copilot token exchange endpoint
pub const DEFAULT_COPILOT_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";

/// Upstream provider profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// ChatGPT Codex backend (Responses API)
    Codex,
    /// Kilo Code gateway (OpenRouter-compatible chat completions)
    Kilo,
    /// GitHub Copilot chat completions
    Copilot,
}

impl Provider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "codex" => Some(Provider::Codex),
            "kilo" => Some(Provider::Kilo),
            "copilot" => Some(Provider::Copilot),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Codex => "codex",
            Provider::Kilo => "kilo",
            Provider::Copilot => "copilot",
        }
    }

    pub fn default_upstream_url(&self) -> &'static str {
        match self {
            Provider::Codex => "https://chatgpt.com/backend-api/codex/responses",
            Provider::Kilo => "https://api.kilocode.ai/api/openrouter/chat/completions",
            Provider::Copilot => "https://api.githubcopilot.com/chat/completions",
        }
    }

    pub fn model_resolution(&self) -> ModelResolution {
        match self {
            Provider::Codex => ModelResolution::Aliased,
            Provider::Kilo => ModelResolution::Verbatim,
            Provider::Copilot => ModelResolution::LastListed,
        }
    }

    /// Profile-specific variable naming the header override file
    fn headers_file_var(&self) -> Option<&'static str> {
        match self {
            Provider::Codex => Some("CODEX_HEADERS_FILE"),
            Provider::Kilo => Some("KILO_HEADERS_FILE"),
            Provider::Copilot => None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    pub provider: Provider,
    /// Upstream endpoint the wire body is POSTed to
    pub upstream_url: String,
    pub upstream_timeout_seconds: u64,

    /// JSON file of header overrides, re-read on every request
    pub headers_file: Option<PathBuf>,
    /// Remove the client's Authorization header unless the override file sets one
    pub strip_authorization: bool,

    /// Reasoning defaults applied to every request
    pub reasoning: ReasoningConfig,

    pub kilo_api_key: Option<String>,
    pub kilo_version: String,
    pub kilo_organization_id: Option<String>,
    pub kilo_project_id: Option<String>,

    /// Copilot token store location
    pub copilot_token_file: PathBuf,
    pub copilot_token_url: String,
    /// Used when the token store has no usable token
    pub copilot_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("RELAY_PROVIDER") {
            Some(name) => match Provider::parse(&name) {
                Some(provider) => provider,
                None => bail!("Invalid RELAY_PROVIDER '{}': expected codex, kilo or copilot", name),
            },
            None => Provider::Codex,
        };

        let headers_file = var("HEADERS_FILE")
            .or_else(|| provider.headers_file_var().and_then(|key| var(key)))
            .map(PathBuf::from);

        let copilot_token_file = var("COPILOT_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = var("HOME")
                    .or_else(|| var("USERPROFILE"))
                    .unwrap_or_else(|| ".".to_string());
                PathBuf::from(home).join(".copilot-tokens.json")
            });

        Ok(Self {
            host: var("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("RELAY_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            provider,
            upstream_url: var("UPSTREAM_URL")
                .unwrap_or_else(|| provider.default_upstream_url().to_string()),
            upstream_timeout_seconds: var("UPSTREAM_TIMEOUT_SECONDS")
                .unwrap_or_else(|| "300".to_string())
                .parse()
                .context("Invalid UPSTREAM_TIMEOUT_SECONDS")?,

            headers_file,
            strip_authorization: var("STRIP_AUTHORIZATION")
                .map(|v| !matches!(v.trim(), "false" | "0"))
                .unwrap_or(true),

            reasoning: reasoning_from(&var),

            kilo_api_key: var("KILO_API_KEY"),
            kilo_version: var("KILO_VERSION").unwrap_or_else(|| "5.1.0".to_string()),
            kilo_organization_id: var("KILO_ORGANIZATION_ID"),
            kilo_project_id: var("KILO_PROJECT_ID"),

            copilot_token_file,
            copilot_token_url: var("COPILOT_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_COPILOT_TOKEN_URL.to_string()),
            copilot_api_key: var("COPILOT_API_KEY"),
        })
    }
}

/// Validated reasoning defaults; bad values warn and keep the default
fn reasoning_from(var: &dyn Fn(&str) -> Option<String>) -> ReasoningConfig {
    let defaults = ReasoningConfig::default();

    let enabled = match var("REASONING_ENABLE").as_deref().map(str::trim) {
        None => defaults.enabled,
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        Some(other) => {
            warn!(
                value = %other,
                default = defaults.enabled,
                "Invalid REASONING_ENABLE, expected a boolean; using default"
            );
            defaults.enabled
        }
    };

    let effort = match var("REASONING_EFFORT") {
        None => defaults.effort,
        Some(value) => ReasoningEffort::parse(value.trim()).unwrap_or_else(|| {
            warn!(
                value = %value,
                allowed = ReasoningEffort::ALLOWED,
                default = defaults.effort.as_str(),
                "Invalid REASONING_EFFORT, using default"
            );
            defaults.effort
        }),
    };

    let summary = match var("REASONING_SUMMARY") {
        None => defaults.summary,
        Some(value) => ReasoningSummary::parse(value.trim()).unwrap_or_else(|| {
            warn!(
                value = %value,
                allowed = ReasoningSummary::ALLOWED,
                default = defaults.summary.as_str(),
                "Invalid REASONING_SUMMARY, using default"
            );
            defaults.summary
        }),
    };

    ReasoningConfig {
        effort,
        summary,
        enabled,
    }
}
