//! Per-response reconstruction state

use std::collections::HashMap;

use crate::canonical::{CanonicalResponse, ToolCallRecord, Usage};

use super::event::{ChatChunk, ResponsesEvent, StreamEvent};

/// What an applied event changed, in application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Role,
    /// Text appended to the message
    Text(String),
    /// A tool call was appended at this position
    ToolCall(usize),
    Usage,
    /// The upstream signalled the end of the response
    Completed,
}

/// Accumulates one upstream response from its events.
///
/// Text and tool calls are append-only, role is last-writer-wins and usage is
/// replaced wholesale.
#[derive(Debug)]
pub struct StreamAccumulator {
    text: String,
    role: String,
    tool_calls: Vec<ToolCallRecord>,
    /// Chat tool-call `index` to position in `tool_calls`
    chat_slots: HashMap<u32, usize>,
    /// Position of each index-less chat tool call, by id
    id_slots: HashMap<String, usize>,
    /// Index-less call that id-less deltas continue
    open_unindexed: Option<usize>,
    usage: Usage,
    /// Delta text seen since the last `output_text.done`
    segment: String,
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self {
            text: String::new(),
            role: "assistant".to_string(),
            tool_calls: Vec::new(),
            chat_slots: HashMap::new(),
            id_slots: HashMap::new(),
            open_unindexed: None,
            usage: Usage::default(),
            segment: String::new(),
        }
    }
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn tool_call(&self, position: usize) -> Option<&ToolCallRecord> {
        self.tool_calls.get(position)
    }

    /// Apply one event and report what changed
    pub fn apply(&mut self, event: &StreamEvent) -> Vec<Update> {
        match event {
            StreamEvent::Responses(event) => self.apply_responses(event),
            StreamEvent::Chat(chunk) => self.apply_chat(chunk),
            StreamEvent::Unknown => Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) -> Vec<Update> {
        if text.is_empty() {
            return Vec::new();
        }
        self.text.push_str(text);
        vec![Update::Text(text.to_string())]
    }

    fn apply_responses(&mut self, event: &ResponsesEvent) -> Vec<Update> {
        match event {
            ResponsesEvent::OutputTextDelta { delta } => {
                let delta = delta.as_deref().unwrap_or_default();
                self.segment.push_str(delta);
                self.push_text(delta)
            }
            ResponsesEvent::OutputTextDone { text } => {
                let text = text.as_deref().unwrap_or_default();
                let segment = std::mem::take(&mut self.segment);
                // Only the part not already streamed as deltas is new.
                let suffix = text.strip_prefix(segment.as_str()).unwrap_or_default();
                self.push_text(suffix)
            }
            ResponsesEvent::OutputItemAdded { item } if item.is("message") => {
                self.segment.clear();
                if let Some(role) = item.role.as_deref().filter(|r| !r.is_empty()) {
                    self.role = role.to_string();
                }
                vec![Update::Role]
            }
            ResponsesEvent::OutputItemDone { item } if item.is("function_call") => {
                self.tool_calls.push(ToolCallRecord {
                    id: item.call_identifier(),
                    name: item.name.clone().unwrap_or_default(),
                    arguments: item.arguments.clone().unwrap_or_default(),
                });
                vec![Update::ToolCall(self.tool_calls.len() - 1)]
            }
            ResponsesEvent::Completed { response } => {
                let mut updates = Vec::new();
                if let Some(usage) = response.as_ref().and_then(|r| r.usage) {
                    self.usage = usage;
                    updates.push(Update::Usage);
                }
                updates.push(Update::Completed);
                updates
            }
            _ => Vec::new(),
        }
    }

    fn apply_chat(&mut self, chunk: &ChatChunk) -> Vec<Update> {
        let mut updates = Vec::new();

        for delta in chunk.choices.iter().filter_map(|c| c.delta.as_ref()) {
            if let Some(role) = delta.role.as_deref().filter(|r| !r.is_empty()) {
                self.role = role.to_string();
                updates.push(Update::Role);
            }
            if let Some(content) = delta.content.as_deref() {
                updates.extend(self.push_text(content));
            }
            for call in delta.tool_calls.iter().flatten() {
                let id = call.id.as_deref().filter(|id| !id.is_empty());
                let (position, opened) = self.chat_slot(call.index, id);
                if opened {
                    updates.push(Update::ToolCall(position));
                }

                let record = &mut self.tool_calls[position];
                if let Some(id) = id {
                    record.id = id.to_string();
                }
                if let Some(function) = &call.function {
                    if let Some(name) = function.name.as_deref().filter(|n| !n.is_empty()) {
                        record.name = name.to_string();
                    }
                    if let Some(arguments) = &function.arguments {
                        record.arguments.push_str(arguments);
                    }
                }
            }
        }

        if let Some(usage) = chunk.usage {
            self.usage = usage;
            updates.push(Update::Usage);
        }

        updates
    }

    /// Position of the record a chat tool-call delta belongs to, and whether
    /// it was just opened.
    ///
    /// Deltas with an `index` merge by index. Without one, a new id opens a
    /// new record and an id-less delta continues the last index-less call.
    fn chat_slot(&mut self, index: Option<u32>, id: Option<&str>) -> (usize, bool) {
        let existing = match (index, id) {
            (Some(index), _) => self.chat_slots.get(&index).copied(),
            (None, Some(id)) => self.id_slots.get(id).copied(),
            (None, None) => self.open_unindexed,
        };
        if let Some(position) = existing {
            if index.is_none() {
                self.open_unindexed = Some(position);
            }
            return (position, false);
        }

        self.tool_calls.push(ToolCallRecord::default());
        let position = self.tool_calls.len() - 1;
        match index {
            Some(index) => {
                self.chat_slots.insert(index, position);
            }
            None => {
                if let Some(id) = id {
                    self.id_slots.insert(id.to_string(), position);
                }
                self.open_unindexed = Some(position);
            }
        }
        (position, true)
    }

    /// Freeze the accumulated state
    pub fn finish(self) -> CanonicalResponse {
        CanonicalResponse {
            role: self.role,
            text: self.text,
            tool_calls: self.tool_calls,
            usage: self.usage,
        }
    }
}
