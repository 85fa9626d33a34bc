//! Live Responses-to-chat transcoding
//!
//! Translates each Responses API event into chat-completion chunks as it
//! arrives. Text is forwarded immediately and never buffered; the accumulator
//! only tracks role, tool calls and usage for the chunks that need them.

use bytes::Bytes;

use super::accumulator::{StreamAccumulator, Update};
use super::event::StreamEvent;
use crate::canonical::encode::{
    finish_chunk, format_sse_done, format_sse_json, role_chunk, text_chunk, tool_call_chunk,
};
use crate::canonical::ResponseMeta;

pub struct ResponsesTranscoder {
    meta: ResponseMeta,
    acc: StreamAccumulator,
    role_sent: bool,
    finished: bool,
    done_sent: bool,
}

impl ResponsesTranscoder {
    pub fn new(meta: ResponseMeta) -> Self {
        Self {
            meta,
            acc: StreamAccumulator::new(),
            role_sent: false,
            finished: false,
            done_sent: false,
        }
    }

    fn ensure_role(&mut self, frames: &mut Vec<Bytes>) {
        if !self.role_sent {
            self.role_sent = true;
            frames.push(format_sse_json(&role_chunk(&self.meta, self.acc.role())));
        }
    }

    fn push_finish(&mut self, frames: &mut Vec<Bytes>) {
        if !self.finished {
            self.ensure_role(frames);
            self.finished = true;
            frames.push(format_sse_json(&finish_chunk(&self.meta, self.acc.usage())));
        }
    }

    /// Frames for one upstream event
    pub fn on_event(&mut self, event: &StreamEvent) -> Vec<Bytes> {
        let mut frames = Vec::new();

        for update in self.acc.apply(event) {
            match update {
                Update::Role => self.ensure_role(&mut frames),
                Update::Text(text) => {
                    self.ensure_role(&mut frames);
                    frames.push(format_sse_json(&text_chunk(&self.meta, &text)));
                }
                Update::ToolCall(position) => {
                    self.ensure_role(&mut frames);
                    if let Some(record) = self.acc.tool_call(position) {
                        let chunk = tool_call_chunk(&self.meta, position as u32, record);
                        frames.push(format_sse_json(&chunk));
                    }
                }
                Update::Usage => {}
                Update::Completed => self.push_finish(&mut frames),
            }
        }

        frames
    }

    /// Closing frames. Safe to call more than once.
    pub fn finish(&mut self) -> Vec<Bytes> {
        let mut frames = Vec::new();
        self.push_finish(&mut frames);
        if !self.done_sent {
            self.done_sent = true;
            frames.push(format_sse_done());
        }
        frames
    }
}
