//! Provider profiles
//!
//! Fixed headers and credential handling for each supported upstream, and
//! the assembly of the final upstream target for one request.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, warn};

use super::credentials::{CredentialSource, COPILOT_CHAT_VERSION};
use super::headers::{synthesize, HeaderPairs};
use super::overrides::HeaderOverrides;
use crate::canonical::{CanonicalRequest, Role};
use crate::config::{Config, Provider};

const KILO_EDITOR_NAME: &str = "Visual Studio Code - Insiders 1.109.0-insider";
const COPILOT_EDITOR_VERSION: &str = "vscode/1.103.2";
const COPILOT_API_VERSION: &str = "2025-04-01";

/// Where and how to send one upstream request
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub url: String,
    pub headers: HeaderMap,
}

fn pair(name: &str, value: impl Into<String>) -> (String, Option<String>) {
    (name.to_string(), Some(value.into()))
}

fn codex_headers() -> HeaderPairs {
    vec![
        pair("Content-Type", "application/json"),
        pair("Accept", "text/event-stream"),
    ]
}

/// Kilo Code client identification, with a fresh task id per request
pub fn kilo_headers(version: &str) -> HeaderPairs {
    vec![
        pair("Accept", "application/json"),
        pair("X-Stainless-Retry-Count", "0"),
        pair("X-Stainless-Lang", "js"),
        pair("X-Stainless-Package-Version", "5.12.2"),
        pair("X-Stainless-OS", "MacOS"),
        pair("X-Stainless-Arch", "arm64"),
        pair("X-Stainless-Runtime", "node"),
        pair("X-Stainless-Runtime-Version", "v22.21.1"),
        pair("HTTP-Referer", "https://kilocode.ai"),
        pair("X-Title", "Kilo Code"),
        pair("X-KiloCode-Version", version),
        pair("User-Agent", format!("Kilo-Code/{}", version)),
        pair("Content-Type", "application/json"),
        pair("X-KiloCode-EditorName", KILO_EDITOR_NAME),
        pair("X-KiloCode-TaskId", uuid::Uuid::new_v4().to_string()),
        pair("Accept-Language", "*"),
        pair("Sec-Fetch-Mode", "cors"),
    ]
}

/// Whether the conversation already contains model or tool turns
fn is_agent_turn(request: &CanonicalRequest) -> bool {
    match &request.passthrough.messages {
        Some(messages) => messages.iter().any(|m| {
            matches!(
                m.get("role").and_then(Value::as_str),
                Some("assistant") | Some("tool")
            )
        }),
        None => request.messages.iter().any(|m| m.role == Role::Assistant),
    }
}

/// Copilot editor headers, flagged for agent turns and image input
pub fn copilot_headers(request: &CanonicalRequest) -> HeaderPairs {
    let mut headers = vec![
        pair("Copilot-Integration-Id", "vscode-chat"),
        pair(
            "Editor-Plugin-Version",
            format!("copilot-chat/{}", COPILOT_CHAT_VERSION),
        ),
        pair("Editor-Version", COPILOT_EDITOR_VERSION),
        pair("User-Agent", format!("GitHubCopilotChat/{}", COPILOT_CHAT_VERSION)),
        pair("OpenAI-Intent", "conversation-panel"),
        pair("X-GitHub-Api-Version", COPILOT_API_VERSION),
        pair(
            "X-Initiator",
            if is_agent_turn(request) { "agent" } else { "user" },
        ),
        pair("X-Request-Id", uuid::Uuid::new_v4().to_string()),
        pair("X-VSCode-User-Agent-Library-Version", "electron-fetch"),
        pair("Content-Type", "application/json"),
    ];
    if request.has_images() {
        headers.push(pair("Copilot-Vision-Request", "true"));
    }
    headers
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => debug!(header = name, "Skipping invalid header value"),
    }
}

/// Resolve the URL and headers for one upstream call.
///
/// Configured credentials are applied after the client's `Authorization` has
/// been stripped, and only when the override file does not set its own.
pub async fn prepare(
    config: &Config,
    credentials: Option<&dyn CredentialSource>,
    request: &CanonicalRequest,
    incoming: &HeaderMap,
) -> UpstreamTarget {
    let overrides = HeaderOverrides::load(config.headers_file.as_deref()).await;

    let credential = match credentials {
        Some(source) => match source.credential().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, provider = config.provider.as_str(), "Credential lookup failed");
                None
            }
        },
        None => None,
    };

    let provider_headers = match config.provider {
        Provider::Codex => codex_headers(),
        Provider::Kilo => kilo_headers(&config.kilo_version),
        Provider::Copilot => copilot_headers(request),
    };

    let mut headers = synthesize(
        incoming,
        &provider_headers,
        &overrides,
        config.strip_authorization,
    );

    let token = credential
        .as_ref()
        .and_then(|c| c.token.clone())
        .or_else(|| match config.provider {
            Provider::Copilot => config.copilot_api_key.clone(),
            _ => None,
        });
    if let Some(token) = token.filter(|_| !overrides.contains_authorization()) {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Configured credential is not a valid header value"),
        }
    }

    if config.provider == Provider::Kilo {
        let passthrough = &request.passthrough;
        if let Some(org) = passthrough
            .organization_id
            .as_deref()
            .or(config.kilo_organization_id.as_deref())
        {
            insert_header(&mut headers, "x-kilocode-organizationid", org);
        }
        if let Some(project) = passthrough
            .project_id
            .as_deref()
            .or(config.kilo_project_id.as_deref())
        {
            insert_header(&mut headers, "x-kilocode-projectid", project);
        }
    }

    let url = credential
        .and_then(|c| c.endpoint)
        .unwrap_or_else(|| config.upstream_url.clone());

    UpstreamTarget { url, headers }
}
