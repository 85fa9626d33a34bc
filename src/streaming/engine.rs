//! Stream reconstruction engine
//!
//! Drives the line buffer over an upstream byte stream in one of three
//! modes: reduce to a single response, pass chat chunks through, or transcode
//! Responses events into chat chunks. Streams are pulled lazily; dropping the
//! returned stream drops the upstream body with it.

use std::convert::Infallible;
use std::fmt::Display;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::{debug, warn};

use super::accumulator::StreamAccumulator;
use super::event::StreamEvent;
use super::passthrough::rewrite_line;
use super::transcode::ResponsesTranscoder;
use super::{SseLine, SseLineBuffer};
use crate::canonical::encode::format_error_event;
use crate::canonical::{CanonicalResponse, ResponseMeta};
use crate::routes::metrics::record_stream_parse_error;

/// Error code reported to clients when the upstream connection fails mid-stream
pub const UPSTREAM_ERROR_CODE: &str = "upstream_error";

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Upstream stream failed: {0}")]
    Transport(String),
}

fn parse_data(line: &str, mode: &'static str) -> Option<StreamEvent> {
    let SseLine::Data(payload) = SseLine::classify(line) else {
        return None;
    };
    match StreamEvent::parse(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(
                error = %e,
                line_len = payload.len(),
                mode = mode,
                "Dropping malformed stream event"
            );
            record_stream_parse_error(mode);
            None
        }
    }
}

/// Reduce a whole upstream stream into one response.
///
/// Reads to the end of the body; nothing partial is returned on failure.
pub async fn reconstruct<S, E>(upstream: S) -> Result<CanonicalResponse, StreamError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    futures::pin_mut!(upstream);
    let mut lines = SseLineBuffer::new();
    let mut acc = StreamAccumulator::new();

    while let Some(chunk) = upstream.next().await {
        let chunk = chunk.map_err(|e| StreamError::Transport(e.to_string()))?;
        for line in lines.feed(&chunk) {
            if let Some(event) = parse_data(&line, "reduce") {
                acc.apply(&event);
            }
        }
    }
    if let Some(line) = lines.finish() {
        if let Some(event) = parse_data(&line, "reduce") {
            acc.apply(&event);
        }
    }

    Ok(acc.finish())
}

/// Forward a chat-dialect upstream line by line
pub fn passthrough<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        futures::pin_mut!(upstream);
        let mut lines = SseLineBuffer::new();

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in lines.feed(&bytes) {
                        if let Some(frame) = rewrite_line(&line) {
                            yield Ok(frame);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Upstream stream failed during passthrough");
                    yield Ok(format_error_event(&e.to_string(), Some(UPSTREAM_ERROR_CODE)));
                    return;
                }
            }
        }

        if let Some(line) = lines.finish() {
            if let Some(frame) = rewrite_line(&line) {
                yield Ok(frame);
            }
        }
    }
}

/// Translate a Responses upstream into chat-completion chunks as it arrives
pub fn transcode<S, E>(
    upstream: S,
    meta: ResponseMeta,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        futures::pin_mut!(upstream);
        let mut lines = SseLineBuffer::new();
        let mut transcoder = ResponsesTranscoder::new(meta);

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in lines.feed(&bytes) {
                        if let Some(event) = parse_data(&line, "transcode") {
                            for frame in transcoder.on_event(&event) {
                                yield Ok(frame);
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Upstream stream failed during transcoding");
                    yield Ok(format_error_event(&e.to_string(), Some(UPSTREAM_ERROR_CODE)));
                    return;
                }
            }
        }

        if let Some(line) = lines.finish() {
            if let Some(event) = parse_data(&line, "transcode") {
                for frame in transcoder.on_event(&event) {
                    yield Ok(frame);
                }
            }
        }
        for frame in transcoder.finish() {
            yield Ok(frame);
        }
    }
}
