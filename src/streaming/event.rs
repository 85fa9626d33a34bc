//! Upstream event taxonomy
//!
//! A data payload is either a typed Responses API event (discriminated by
//! `type`) or a chat-completion chunk (no `type`, carries `choices`).

use serde::Deserialize;
use serde_json::Value;

use crate::canonical::Usage;

/// Output item carried by `response.output_item.*` events
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Raw argument string, never re-serialized
    #[serde(default)]
    pub arguments: Option<String>,
}

impl OutputItem {
    pub fn is(&self, item_type: &str) -> bool {
        self.item_type.as_deref() == Some(item_type)
    }

    /// Identifier for a function call, preferring `call_id`
    pub fn call_identifier(&self) -> String {
        self.call_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.id.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

/// Body of a `response.completed` event
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CompletedResponse {
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Responses API streaming events the relay understands
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ResponsesEvent {
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        #[serde(default)]
        delta: Option<String>,
    },
    #[serde(rename = "response.output_text.done")]
    OutputTextDone {
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        #[serde(default)]
        item: OutputItem,
    },
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        #[serde(default)]
        item: OutputItem,
    },
    #[serde(rename = "response.completed")]
    Completed {
        #[serde(default)]
        response: Option<CompletedResponse>,
    },
    #[serde(other)]
    Unknown,
}

/// Function fragment of a chat tool-call delta
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChunkFunction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Tool-call delta as sent by chat upstreams; `index` may be missing
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChunkToolCall {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<ChunkFunction>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
}

/// A `chat.completion.chunk` payload
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One parsed data payload
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Responses(ResponsesEvent),
    Chat(ChatChunk),
    /// Valid JSON in neither taxonomy
    Unknown,
}

impl StreamEvent {
    /// Parse a data payload. Only malformed JSON (or a known event with
    /// mistyped fields) is an error; unfamiliar shapes are `Unknown`.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(payload)?;

        if value.get("type").is_some_and(Value::is_string) {
            return serde_json::from_value(value).map(StreamEvent::Responses);
        }
        if value.get("choices").is_some() || value.get("usage").is_some() {
            return serde_json::from_value(value).map(StreamEvent::Chat);
        }
        Ok(StreamEvent::Unknown)
    }
}
