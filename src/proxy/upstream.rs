//! Upstream HTTP client
//!
//! POSTs the wire body to the resolved upstream and hands back the response
//! body as a byte stream for the reconstruction engine.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Upstream response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Client for the configured upstream provider
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .timeout(Duration::from_secs(config.upstream_timeout_seconds))
            .build()?;
        Ok(Self { client })
    }

    /// Underlying client, shared with the credential store
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send the wire body; non-success statuses become `UpstreamStatus`
    #[instrument(skip(self, body, headers), fields(url = %url))]
    pub async fn send(&self, url: &str, body: &Value, headers: HeaderMap) -> AppResult<ByteStream> {
        debug!(header_count = headers.len(), "Sending request upstream");

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to reach upstream");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body_len = body.len(), "Upstream rejected request");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = %status, "Upstream accepted request");
        Ok(Box::pin(response.bytes_stream()))
    }
}
