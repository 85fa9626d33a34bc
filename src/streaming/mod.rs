//! SSE (Server-Sent Events) stream reconstruction
//!
//! Upstream bodies arrive as arbitrary byte chunks. [`SseLineBuffer`] turns
//! them into complete lines, [`SseLine`] classifies each line, and the
//! submodules reduce, forward or transcode the parsed events.

pub mod accumulator;
pub mod engine;
pub mod event;
pub mod passthrough;
pub mod transcode;

pub use accumulator::{StreamAccumulator, Update};
pub use engine::{passthrough, reconstruct, transcode, StreamError};
pub use event::StreamEvent;
pub use transcode::ResponsesTranscoder;

/// Buffer for accumulating incomplete SSE lines across chunk boundaries.
///
/// Bytes are held until a newline arrives and only then decoded, so a
/// multi-byte UTF-8 sequence split across two chunks is never corrupted.
///
/// # Example
/// ```
/// use relay::streaming::SseLineBuffer;
///
/// let mut buffer = SseLineBuffer::new();
///
/// let lines = buffer.feed(b"data: {\"content\":\"hel");
/// assert!(lines.is_empty());
///
/// let lines = buffer.feed(b"lo\"}\r\n");
/// assert_eq!(lines, vec!["data: {\"content\":\"hello\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    /// Bytes received but not yet forming a complete line
    tail: Vec<u8>,
    /// Prefix of `tail` already known to contain no newline
    scanned: usize,
}

impl SseLineBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the buffer and return every complete line.
    ///
    /// The `\n` terminator and a trailing `\r` are stripped. Blank lines are
    /// returned too; they delimit SSE events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.tail.extend_from_slice(bytes);

        let fresh = &self.tail[self.scanned..];
        let Some(last_newline) = fresh.iter().rposition(|&b| b == b'\n') else {
            self.scanned = self.tail.len();
            return Vec::new();
        };
        let last_newline = self.scanned + last_newline;

        let rest = self.tail.split_off(last_newline + 1);
        self.scanned = rest.len();
        let complete = std::mem::replace(&mut self.tail, rest);

        complete[..complete.len() - 1]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Flush whatever remains at end of stream as a final line
    pub fn finish(&mut self) -> Option<String> {
        if self.tail.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.tail);
        self.scanned = 0;
        Some(decode_line(&tail))
    }

    /// Check if there's any incomplete data remaining in the buffer.
    pub fn has_incomplete(&self) -> bool {
        !self.tail.is_empty()
    }
}

fn decode_line(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Classification of one SSE line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    Blank,
    /// `:`-prefixed keep-alive or annotation
    Comment,
    /// Trimmed payload of a `data:` line
    Data(&'a str),
    /// The `[DONE]` sentinel
    Done,
    /// Any other field line (`event:`, `id:`, ...), kept raw
    Other(&'a str),
}

impl<'a> SseLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return SseLine::Blank;
        }
        if line.starts_with(':') {
            return SseLine::Comment;
        }
        match line.strip_prefix("data:") {
            Some(payload) => match payload.trim() {
                "[DONE]" => SseLine::Done,
                payload => SseLine::Data(payload),
            },
            None => SseLine::Other(line),
        }
    }
}
