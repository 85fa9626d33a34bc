//! Error types for the relay
//!
//! `AppError` is the HTTP-facing error; lower layers define their own
//! `thiserror` enums and convert into it at the handler boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::streaming::StreamError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// The upstream answered with a non-success status
    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StreamError> for AppError {
    fn from(err: StreamError) -> Self {
        AppError::UpstreamError(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// What the upstream actually sent back
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub upstream_status: u16,
    pub upstream_body: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::UpstreamStatus { status, body } => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                format!("Upstream returned status {}", status),
                Some(ErrorDetails {
                    upstream_status: *status,
                    upstream_body: body.clone(),
                }),
            ),
            AppError::UpstreamError(msg) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                msg.clone(),
                None,
            ),
            AppError::HttpError(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream service error".to_string(),
                None,
            ),
            AppError::JsonError(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_JSON",
                "Invalid JSON in request".to_string(),
                None,
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
