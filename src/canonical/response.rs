//! Response types
//!
//! The reconstructed canonical response plus the chat-completion wire
//! shapes (documents and stream chunks) it is rendered into.

use serde::{Deserialize, Serialize};

/// Token usage statistics
///
/// Accepts the Responses API spelling (`input_tokens`/`output_tokens`) when
/// deserializing so usage from either upstream dialect lands in one shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Usage {
    /// Number of tokens in the prompt
    #[serde(default, alias = "input_tokens")]
    pub prompt_tokens: u64,
    /// Number of tokens in the completion
    #[serde(default, alias = "output_tokens")]
    pub completion_tokens: u64,
    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u64,
}

/// A completed tool call, arguments kept as the upstream's raw string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// The fully reconstructed logical message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalResponse {
    pub role: String,
    pub text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub usage: Usage,
}

/// Function call within a tool call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallFunction {
    pub name: String,
    /// Arguments exactly as the upstream produced them
    pub arguments: String,
}

/// A tool call from the assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    /// Type of tool call (always "function")
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: ToolCallFunction,
}

impl From<&ToolCallRecord> for ToolCall {
    fn from(record: &ToolCallRecord) -> Self {
        Self {
            id: record.id.clone(),
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: record.name.clone(),
                arguments: record.arguments.clone(),
            },
        }
    }
}

/// Message in a completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceMessage {
    pub role: String,
    pub content: String,
    /// Only present when the assistant called tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Choice {
    pub index: u32,
    pub message: ChoiceMessage,
    pub finish_reason: String,
}

/// Chat completion response (non-streaming)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatCompletionResponse {
    pub id: String,
    /// Object type (always "chat.completion")
    pub object: String,
    /// Unix timestamp of creation
    pub created: u64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

/// Function call delta in streaming tool calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ToolCallFunctionDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Tool call delta in streaming responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallDelta {
    /// Index of this tool call in the parallel set
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<ToolCallFunctionDelta>,
}

/// Delta content in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Delta {
    /// Role (only present in first chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// A choice in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: Delta,
    /// Reason the generation stopped (only in final chunk)
    pub finish_reason: Option<String>,
}

/// Streaming chunk for chat completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamChunk {
    pub id: String,
    /// Object type (always "chat.completion.chunk")
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<StreamChoice>,
    /// Token usage (only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}
