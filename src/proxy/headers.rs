//! Outbound header synthesis
//!
//! Layers client headers, the provider profile's fixed headers and the
//! operator's override file into the header set sent upstream.

use std::collections::BTreeMap;

use axum::http::header::{self, HeaderName};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use super::overrides::HeaderOverrides;

/// One header layer entry; `None` marks a header removed by that layer
pub type HeaderPairs = Vec<(String, Option<String>)>;

/// Headers that must never be forwarded upstream
const DROPPED_HEADERS: &[HeaderName] = &[
    header::HOST,
    header::CONTENT_LENGTH,
    header::ACCEPT_ENCODING,
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Check if a header is one the relay never forwards
pub fn is_dropped_header(name: &str) -> bool {
    DROPPED_HEADERS
        .iter()
        .any(|dropped| dropped.as_str().eq_ignore_ascii_case(name))
        || name.eq_ignore_ascii_case("keep-alive")
}

/// Merge the three header layers into the outbound header map.
///
/// Later layers win: request < provider < overrides. Keys compare
/// case-insensitively. Unless `strip_authorization` is off or the override
/// file sets its own, the client's `Authorization` is removed.
pub fn synthesize(
    request: &HeaderMap,
    provider: &HeaderPairs,
    overrides: &HeaderOverrides,
    strip_authorization: bool,
) -> HeaderMap {
    let mut merged: BTreeMap<String, Option<String>> = BTreeMap::new();

    for (name, value) in request {
        match value.to_str() {
            Ok(value) => {
                merged.insert(name.as_str().to_string(), Some(value.to_string()));
            }
            Err(_) => debug!(header = %name, "Skipping non-text request header"),
        }
    }
    for (name, value) in provider.iter().chain(overrides.entries()) {
        merged.insert(name.to_ascii_lowercase(), value.clone());
    }

    if strip_authorization && !overrides.contains_authorization() {
        merged.remove("authorization");
    }

    let mut headers = HeaderMap::new();
    for (name, value) in merged {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        if is_dropped_header(&name) {
            continue;
        }

        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => debug!(header = %name, "Skipping invalid outbound header"),
        }
    }

    headers
}

/// Read an optional header as text
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
