//! Chat Completions request rendering
//!
//! Used for upstreams that already speak the client's dialect. The client's
//! own `messages` array is forwarded as-is so tool results and assistant
//! tool calls survive; only legacy prompt requests are rendered from the
//! canonical messages.

use serde_json::{json, Map, Value};

use super::normalize::is_truthy;
use super::{AdapterKind, WireAdapter};
use crate::canonical::{CanonicalMessage, CanonicalRequest, ContentPart, Tool, ToolChoice};

/// Completion budget applied when the client sets none
pub const DEFAULT_MAX_TOKENS: u64 = 4096;

/// How client sampling fields are carried over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sampling {
    /// Only `max_tokens` and `temperature`, with defaults filled in
    Defaulted,
    /// Every retained sampling field, no defaults
    Forwarded,
}

/// Renders canonical requests as Chat Completions bodies
#[derive(Debug, Clone, Copy)]
pub struct ChatAdapter {
    sampling: Sampling,
}

impl ChatAdapter {
    /// Kilo gateway flavour
    pub fn kilo() -> Self {
        Self {
            sampling: Sampling::Defaulted,
        }
    }

    /// Copilot flavour
    pub fn copilot() -> Self {
        Self {
            sampling: Sampling::Forwarded,
        }
    }

    fn render_message(message: &CanonicalMessage) -> Value {
        let content = match message.parts.as_slice() {
            [ContentPart::Text { value }] => json!(value),
            parts => Value::Array(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { value } => json!({"type": "text", "text": value}),
                        ContentPart::Image { url } => {
                            json!({"type": "image_url", "image_url": {"url": url}})
                        }
                    })
                    .collect(),
            ),
        };

        json!({"role": message.role.as_str(), "content": content})
    }

    fn tool(tool: &Tool) -> Value {
        match tool {
            Tool::Function(spec) => {
                let mut function = Map::new();
                function.insert("name".into(), json!(spec.name));
                if let Some(description) = &spec.description {
                    function.insert("description".into(), json!(description));
                }
                if let Some(parameters) = &spec.parameters {
                    function.insert("parameters".into(), parameters.clone());
                }
                json!({"type": "function", "function": function})
            }
            Tool::Raw(raw) => raw.clone(),
        }
    }

    fn tool_choice(choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Mode(mode) => json!(mode),
            ToolChoice::Function { name } => {
                json!({"type": "function", "function": {"name": name}})
            }
            ToolChoice::Raw(raw) => raw.clone(),
        }
    }
}

impl WireAdapter for ChatAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Chat
    }

    fn to_wire_body(&self, request: &CanonicalRequest) -> Value {
        let passthrough = &request.passthrough;
        let mut body = Map::new();

        body.insert("model".into(), json!(request.model));
        let messages = match &passthrough.messages {
            Some(messages) => Value::Array(messages.clone()),
            None => Value::Array(request.messages.iter().map(Self::render_message).collect()),
        };
        body.insert("messages".into(), messages);

        match self.sampling {
            Sampling::Defaulted => {
                let max_tokens = passthrough
                    .sampling
                    .get("max_tokens")
                    .filter(|v| is_truthy(Some(v)))
                    .cloned()
                    .unwrap_or_else(|| json!(DEFAULT_MAX_TOKENS));
                let temperature = passthrough
                    .sampling
                    .get("temperature")
                    .cloned()
                    .unwrap_or_else(|| json!(0));
                body.insert("max_tokens".into(), max_tokens);
                body.insert("temperature".into(), temperature);
            }
            Sampling::Forwarded => {
                for (key, value) in &passthrough.sampling {
                    body.insert(key.clone(), value.clone());
                }
            }
        }

        body.insert("stream".into(), json!(true));

        let has_tools = !request.tools.is_empty();
        if has_tools {
            body.insert(
                "tools".into(),
                Value::Array(request.tools.iter().map(Self::tool).collect()),
            );
        }
        if let Some(choice) = &request.tool_choice {
            body.insert("tool_choice".into(), Self::tool_choice(choice));
        }
        if has_tools || request.tool_choice.is_some() {
            body.insert(
                "parallel_tool_calls".into(),
                json!(request.parallel_tool_calls),
            );
        }

        Value::Object(body)
    }
}
