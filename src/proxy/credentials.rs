//! Upstream credentials
//!
//! A [`CredentialSource`] supplies the bearer token (and optionally an
//! endpoint) used for upstream calls. Kilo uses a fixed API key; Copilot uses
//! a token file whose short-lived token is refreshed from a GitHub token.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// A token is treated as expired this many seconds before it actually expires
pub const EXPIRY_BUFFER_SECS: i64 = 300;

pub(crate) const COPILOT_CHAT_VERSION: &str = "0.26.7";

/// Errors from credential lookup and refresh
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read token store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token store is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Token refresh request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token refresh rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("No GitHub token available to refresh the Copilot token")]
    MissingGithubToken,

    #[error("Token refresh response contained no token")]
    MissingToken,
}

/// Credential resolved for one upstream call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credential {
    /// Bearer token, if one is available
    pub token: Option<String>,
    /// Endpoint that replaces the configured upstream URL
    pub endpoint: Option<String>,
    /// Unix seconds
    pub expires_at: Option<i64>,
}

/// Source of upstream credentials
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Current credential, or `None` when the source has nothing to offer
    async fn credential(&self) -> Result<Option<Credential>, CredentialError>;
}

/// A fixed API key
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: String,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(Some(Credential {
            token: Some(self.token.clone()),
            ..Default::default()
        }))
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// On-disk token store record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copilot_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Fields written by other tools, preserved on write-back
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenRecord {
    /// Missing expiry counts as expired
    pub fn is_expired(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - EXPIRY_BUFFER_SECS,
            None => true,
        }
    }

    fn to_credential(&self) -> Credential {
        Credential {
            token: self.copilot_token.clone().filter(|t| !t.is_empty()),
            endpoint: self.endpoint.clone().filter(|e| !e.is_empty()),
            expires_at: self.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshEndpoints {
    #[serde(default)]
    api: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    expires_at: Option<i64>,
    #[serde(default)]
    endpoints: Option<RefreshEndpoints>,
}

fn chat_endpoint(api: &str) -> String {
    if api.ends_with("/chat/completions") {
        api.to_string()
    } else {
        format!("{}/chat/completions", api.trim_end_matches('/'))
    }
}

/// Copilot token file with expiry-buffered refresh.
///
/// Refreshes are single-flight: callers that find the token expired queue on
/// `refresh_lock`. A caller that queued while another attempt ran takes that
/// attempt's outcome, whether it succeeded or fell back to the stale record.
pub struct TokenStore {
    path: PathBuf,
    client: reqwest::Client,
    token_url: String,
    /// Outcome of the most recent refresh attempt
    refresh_lock: Mutex<Option<TokenRecord>>,
    /// Completed refresh attempts
    attempts: AtomicU64,
}

impl TokenStore {
    pub fn new(path: PathBuf, client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            path,
            client,
            token_url: token_url.into(),
            refresh_lock: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    async fn read(&self) -> Result<Option<TokenRecord>, CredentialError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Replace the store through a sibling temp file so readers never see a
    /// partial record
    async fn write(&self, record: &TokenRecord) {
        let staging = self.path.with_extension("tmp");
        let result = async {
            let json = serde_json::to_string_pretty(record).map_err(|e| e.to_string())?;
            tokio::fs::write(&staging, json)
                .await
                .map_err(|e| e.to_string())?;
            tokio::fs::rename(&staging, &self.path)
                .await
                .map_err(|e| e.to_string())
        }
        .await;
        if let Err(error) = result {
            warn!(path = %self.path.display(), error = %error, "Failed to write refreshed token");
        }
    }

    #[instrument(skip(self, record), fields(token_url = %self.token_url))]
    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, CredentialError> {
        let github_token = record
            .github_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(CredentialError::MissingGithubToken)?;

        let response = self
            .client
            .get(&self.token_url)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", github_token))
            .header("User-Agent", format!("GitHubCopilotChat/{}", COPILOT_CHAT_VERSION))
            .header("Editor-Version", "vscode/1.99.3")
            .header("Editor-Plugin-Version", format!("copilot-chat/{}", COPILOT_CHAT_VERSION))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let refreshed: RefreshResponse = response.json().await?;
        let token = refreshed
            .token
            .filter(|t| !t.is_empty())
            .ok_or(CredentialError::MissingToken)?;
        let endpoint = refreshed
            .endpoints
            .and_then(|e| e.api)
            .filter(|api| !api.is_empty())
            .map(|api| chat_endpoint(&api))
            .or_else(|| record.endpoint.clone());

        info!(expires_at = ?refreshed.expires_at, "Copilot token refreshed");

        Ok(TokenRecord {
            copilot_token: Some(token),
            endpoint,
            expires_at: refreshed.expires_at,
            last_updated: Some(chrono::Utc::now().to_rfc3339()),
            ..record.clone()
        })
    }

    /// Current record, refreshed first when expired.
    ///
    /// A failed refresh falls back to the stale record.
    pub async fn current(&self) -> Result<Option<TokenRecord>, CredentialError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let Some(record) = self.read().await? else {
            return Ok(None);
        };
        if !record.is_expired(chrono::Utc::now().timestamp()) {
            return Ok(Some(record));
        }

        let mut last = self.refresh_lock.lock().await;
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(outcome) = last.clone() {
                debug!("Reusing outcome of a concurrent refresh");
                return Ok(Some(outcome));
            }
        }

        let Some(record) = self.read().await? else {
            return Ok(None);
        };
        if !record.is_expired(chrono::Utc::now().timestamp()) {
            debug!("Token refreshed by a concurrent caller");
            return Ok(Some(record));
        }

        let outcome = match self.refresh(&record).await {
            Ok(updated) => {
                self.write(&updated).await;
                updated
            }
            Err(e) => {
                warn!(error = %e, "Copilot token refresh failed, using stored token");
                record
            }
        };
        *last = Some(outcome.clone());
        self.attempts.fetch_add(1, Ordering::Release);
        Ok(Some(outcome))
    }
}

#[async_trait]
impl CredentialSource for TokenStore {
    async fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self.current().await?.map(|record| record.to_credential()))
    }
}
