//! Request normalization
//!
//! Folds the inbound request shapes (legacy `prompt`/`suffix` or chat-style
//! `messages[]`) into a [`CanonicalRequest`]. Normalization never fails:
//! malformed fields fall back to defaults or are dropped.

use serde_json::{Map, Value};
use tracing::debug;

use crate::canonical::{
    CanonicalMessage, CanonicalRequest, ChatPassthrough, ContentPart, ReasoningConfig, Role, Tool,
    ToolChoice, ToolSpec, DEFAULT_INSTRUCTIONS,
};

/// Model used when the client names none
pub const DEFAULT_MODEL: &str = "gpt-5.2-codex";

/// Sampling fields retained for chat-dialect upstreams
const SAMPLING_FIELDS: &[&str] = &[
    "max_tokens",
    "temperature",
    "top_p",
    "stop",
    "presence_penalty",
    "frequency_penalty",
    "seed",
    "user",
    "n",
];

/// How the inbound model name is mapped to the upstream's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelResolution {
    /// Strip any `:variant` suffix and apply the Codex alias table
    #[default]
    Aliased,
    /// Forward the trimmed name unchanged
    Verbatim,
    /// Take the last entry of a comma-separated list
    LastListed,
}

impl ModelResolution {
    pub fn resolve(&self, raw: Option<&Value>) -> String {
        let name = match raw.and_then(Value::as_str).map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return DEFAULT_MODEL.to_string(),
        };

        match self {
            Self::Aliased => {
                let base = name.split(':').next().unwrap_or(name).trim();
                match base {
                    "gpt-5.2-codex" | "gpt-5.2-codex-latest" | "gpt5" | "gpt-5" | "codex" => {
                        DEFAULT_MODEL.to_string()
                    }
                    other => other.to_string(),
                }
            }
            Self::Verbatim => name.to_string(),
            Self::LastListed => match name.rsplit(',').next().map(str::trim) {
                Some(last) if !last.is_empty() => last.to_string(),
                _ => name.to_string(),
            },
        }
    }
}

/// Profile-level inputs to normalization
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeSettings {
    /// Configured reasoning defaults
    pub reasoning: ReasoningConfig,
    pub models: ModelResolution,
}

/// JavaScript-style truthiness, matching how clients tend to toggle fields
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Normalize a raw inbound request body
pub fn normalize(raw: &Value, settings: &NormalizeSettings) -> CanonicalRequest {
    let empty = Map::new();
    let body = raw.as_object().unwrap_or(&empty);

    let legacy = body.contains_key("prompt");

    let mut instructions = body
        .get("instructions")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let messages = if legacy {
        prompt_messages(body)
    } else {
        let raw_messages = body.get("messages").and_then(Value::as_array);
        if let Some(system) = raw_messages.and_then(|msgs| first_system_instructions(msgs)) {
            instructions = system;
        }
        raw_messages.map(|msgs| chat_messages(msgs)).unwrap_or_default()
    };

    if instructions.trim().is_empty() {
        instructions = DEFAULT_INSTRUCTIONS.to_string();
    }

    let reasoning = if settings.reasoning.enabled || is_truthy(body.get("reasoning")) {
        Some(
            settings
                .reasoning
                .with_overrides(body.get("reasoning").and_then(Value::as_object)),
        )
    } else {
        None
    };

    CanonicalRequest {
        model: settings.models.resolve(body.get("model")),
        instructions,
        messages,
        tools: tools(body.get("tools")),
        tool_choice: tool_choice(body.get("tool_choice")),
        reasoning,
        stream: matches!(body.get("stream"), Some(Value::Bool(true))),
        parallel_tool_calls: body
            .get("parallel_tool_calls")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        passthrough: passthrough(body, legacy),
    }
}

fn prompt_messages(body: &Map<String, Value>) -> Vec<CanonicalMessage> {
    let prompt = match body.get("prompt") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };

    let mut messages = vec![CanonicalMessage::text(Role::User, prompt)];
    if let Some(suffix) = body.get("suffix").and_then(Value::as_str) {
        if !suffix.is_empty() {
            messages.push(CanonicalMessage::text(Role::Assistant, suffix));
        }
    }
    messages
}

fn message_role(message: &Value) -> Option<&str> {
    message
        .get("role")
        .and_then(Value::as_str)
        .filter(|role| !role.is_empty())
}

fn first_system_instructions(messages: &[Value]) -> Option<String> {
    let system = messages
        .iter()
        .find(|m| message_role(m) == Some("system"))?;

    match system.get("content") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(parts)) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| {
                    let part = part.as_object()?;
                    let text = part
                        .get("text")
                        .filter(|v| is_truthy(Some(v)))
                        .or_else(|| part.get("content"))?;
                    text.as_str().filter(|t| !t.is_empty())
                })
                .collect();
            Some(texts.join("\n"))
        }
        _ => None,
    }
}

fn chat_messages(messages: &[Value]) -> Vec<CanonicalMessage> {
    messages
        .iter()
        .filter_map(|message| {
            let role = match message_role(message)? {
                "system" => return None,
                "assistant" => Role::Assistant,
                _ => Role::User,
            };
            Some(CanonicalMessage {
                role,
                parts: content_parts(message.get("content")),
            })
        })
        .collect()
}

fn content_parts(content: Option<&Value>) -> Vec<ContentPart> {
    match content {
        Some(Value::String(s)) => vec![ContentPart::text(s.clone())],
        Some(Value::Array(items)) => items.iter().filter_map(content_part).collect(),
        Some(Value::Object(_)) => {
            debug!("Dropping object-shaped message content");
            Vec::new()
        }
        other if !is_truthy(other) => vec![ContentPart::text("")],
        Some(scalar) => vec![ContentPart::text(scalar.to_string())],
        None => vec![ContentPart::text("")],
    }
}

fn content_part(item: &Value) -> Option<ContentPart> {
    if let Some(text) = item.as_str() {
        return Some(ContentPart::text(text));
    }

    let item = item.as_object()?;
    match item.get("type").and_then(Value::as_str) {
        Some("text") => Some(ContentPart::text(
            item.get("text").and_then(Value::as_str).unwrap_or_default(),
        )),
        Some("image_url") => item
            .get("image_url")
            .and_then(|image| image.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(|url| ContentPart::Image {
                url: url.to_string(),
            }),
        _ => None,
    }
}

fn tools(raw: Option<&Value>) -> Vec<Tool> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| match item.get("function") {
            Some(function) if is_truthy(Some(function)) => Tool::Function(ToolSpec {
                name: function
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                description: function
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                parameters: function.get("parameters").filter(|p| !p.is_null()).cloned(),
            }),
            _ => Tool::Raw(item.clone()),
        })
        .collect()
}

fn tool_choice(raw: Option<&Value>) -> Option<ToolChoice> {
    if !is_truthy(raw) {
        return None;
    }
    let raw = raw?;

    if let Some(mode) = raw.as_str() {
        return Some(ToolChoice::Mode(mode.to_string()));
    }

    let forced = raw.get("type").and_then(Value::as_str) == Some("function");
    let name = raw
        .get("function")
        .and_then(|f| f.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty());

    match (forced, name) {
        (true, Some(name)) => Some(ToolChoice::Function {
            name: name.to_string(),
        }),
        _ => Some(ToolChoice::Raw(raw.clone())),
    }
}

fn passthrough(body: &Map<String, Value>, legacy: bool) -> ChatPassthrough {
    let sampling = SAMPLING_FIELDS
        .iter()
        .filter_map(|field| {
            body.get(*field)
                .filter(|v| !v.is_null())
                .map(|v| (field.to_string(), v.clone()))
        })
        .collect();

    let non_empty = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    ChatPassthrough {
        messages: if legacy {
            None
        } else {
            body.get("messages").and_then(Value::as_array).cloned()
        },
        sampling,
        organization_id: non_empty("organization_id"),
        project_id: non_empty("project_id"),
    }
}
