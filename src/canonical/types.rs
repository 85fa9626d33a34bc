//! Core request types for the canonical model
//!
//! Defines the provider-agnostic shapes the normalizer produces and the
//! adapters consume: roles, content parts, messages, tools and reasoning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Instructions used when the client supplies none
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant.";

/// Role of a message participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing instructions
    System,
    /// User message from the human
    User,
    /// Assistant message from the AI
    Assistant,
}

impl Role {
    /// Wire spelling of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Plain text
    Text { value: String },
    /// Image reference (HTTP or data URL)
    Image { url: String },
}

impl ContentPart {
    pub fn text(value: impl Into<String>) -> Self {
        ContentPart::Text {
            value: value.into(),
        }
    }
}

/// A conversation message in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage {
    /// Author of the message
    pub role: Role,
    /// Content parts in the order the client sent them
    pub parts: Vec<ContentPart>,
}

impl CanonicalMessage {
    /// Build a message with a single text part
    pub fn text(role: Role, value: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![ContentPart::text(value)],
        }
    }

    /// Whether any part references an image
    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, ContentPart::Image { .. }))
    }
}

/// Function tool declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    /// Function name
    pub name: String,
    /// Optional description shown to the model
    pub description: Option<String>,
    /// JSON Schema of the function parameters
    pub parameters: Option<Value>,
}

/// A tool entry from the inbound request
///
/// Only function-shaped declarations are interpreted; anything else is kept
/// verbatim so adapters can forward it in its original position.
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    Function(ToolSpec),
    Raw(Value),
}

/// Tool choice for controlling tool usage
#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    /// A plain mode string such as "auto", "none" or "required"
    Mode(String),
    /// Force a specific function
    Function { name: String },
    /// Unrecognized shape, forwarded untouched
    Raw(Value),
}

/// Reasoning effort requested from the upstream model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
    None,
    #[default]
    Minimal,
}

impl ReasoningEffort {
    pub const ALLOWED: &'static str = "low, medium, high, none, minimal";

    /// Parse a member of the enumerated set; anything else is rejected
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "none" => Some(Self::None),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::None => "none",
            Self::Minimal => "minimal",
        }
    }
}

/// Reasoning summary verbosity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningSummary {
    #[default]
    Auto,
    Concise,
    Detailed,
    None,
}

impl ReasoningSummary {
    pub const ALLOWED: &'static str = "auto, concise, detailed, none";

    /// Parse a member of the enumerated set; anything else is rejected
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::Auto),
            "concise" => Some(Self::Concise),
            "detailed" => Some(Self::Detailed),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Concise => "concise",
            Self::Detailed => "detailed",
            Self::None => "none",
        }
    }
}

/// Reasoning parameters, either as configured defaults or resolved per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReasoningConfig {
    pub effort: ReasoningEffort,
    pub summary: ReasoningSummary,
    pub enabled: bool,
}

impl ReasoningConfig {
    /// Apply per-request overrides on top of these defaults.
    ///
    /// Values outside the enumerated sets fall back to the defaults and are
    /// reported to operators; they never reach the upstream body.
    pub fn with_overrides(&self, overrides: Option<&Map<String, Value>>) -> Self {
        let effort = match overrides.and_then(|o| o.get("effort")) {
            None | Some(Value::Null) => self.effort,
            Some(value) => match value.as_str().and_then(ReasoningEffort::parse) {
                Some(effort) => effort,
                None => {
                    warn!(
                        value = %value,
                        allowed = ReasoningEffort::ALLOWED,
                        default = self.effort.as_str(),
                        "Invalid reasoning.effort override, using default"
                    );
                    self.effort
                }
            },
        };

        let summary = match overrides.and_then(|o| o.get("summary")) {
            None | Some(Value::Null) => self.summary,
            Some(value) => match value.as_str().and_then(ReasoningSummary::parse) {
                Some(summary) => summary,
                None => {
                    warn!(
                        value = %value,
                        allowed = ReasoningSummary::ALLOWED,
                        default = self.summary.as_str(),
                        "Invalid reasoning.summary override, using default"
                    );
                    self.summary
                }
            },
        };

        Self {
            effort,
            summary,
            enabled: true,
        }
    }
}

/// Client fields kept for upstreams that speak the client's own chat dialect
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatPassthrough {
    /// The inbound `messages` array, untouched (absent in legacy prompt mode)
    pub messages: Option<Vec<Value>>,
    /// Sampling fields such as `max_tokens` and `temperature`
    pub sampling: Map<String, Value>,
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
}

/// Provider-agnostic request produced by the normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRequest {
    /// Resolved upstream model name
    pub model: String,
    /// System instructions, never empty
    pub instructions: String,
    /// Non-system messages in conversation order
    pub messages: Vec<CanonicalMessage>,
    pub tools: Vec<Tool>,
    pub tool_choice: Option<ToolChoice>,
    /// Present only when reasoning is enabled for this request
    pub reasoning: Option<ReasoningConfig>,
    /// Whether the client asked for a streamed response
    pub stream: bool,
    pub parallel_tool_calls: bool,
    pub passthrough: ChatPassthrough,
}

impl CanonicalRequest {
    /// Whether any message carries an image part
    pub fn has_images(&self) -> bool {
        self.messages.iter().any(CanonicalMessage::has_image)
    }
}
