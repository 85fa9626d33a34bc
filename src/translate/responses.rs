//! Responses API request rendering

use serde_json::{json, Map, Value};

use super::{AdapterKind, WireAdapter};
use crate::canonical::{CanonicalMessage, CanonicalRequest, ContentPart, Tool, ToolChoice};

/// Extra output requested when reasoning is enabled
const ENCRYPTED_REASONING: &str = "reasoning.encrypted_content";

/// Renders canonical requests as Responses API bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponsesAdapter;

impl ResponsesAdapter {
    fn input_item(message: &CanonicalMessage) -> Value {
        let content: Vec<Value> = message
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { value } => json!({"type": "input_text", "text": value}),
                ContentPart::Image { url } => json!({"type": "input_image", "image_url": url}),
            })
            .collect();

        json!({"role": message.role.as_str(), "content": content})
    }

    fn tool(tool: &Tool) -> Value {
        match tool {
            Tool::Function(spec) => {
                let mut out = Map::new();
                out.insert("type".into(), json!("function"));
                out.insert("name".into(), json!(spec.name));
                if let Some(description) = &spec.description {
                    out.insert("description".into(), json!(description));
                }
                if let Some(parameters) = &spec.parameters {
                    out.insert("parameters".into(), parameters.clone());
                }
                Value::Object(out)
            }
            Tool::Raw(raw) => raw.clone(),
        }
    }

    fn tool_choice(choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Mode(mode) => json!(mode),
            ToolChoice::Function { name } => json!({"type": "function", "name": name}),
            ToolChoice::Raw(raw) => raw.clone(),
        }
    }
}

impl WireAdapter for ResponsesAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Responses
    }

    fn to_wire_body(&self, request: &CanonicalRequest) -> Value {
        let mut body = Map::new();
        body.insert("model".into(), json!(request.model));
        body.insert("instructions".into(), json!(request.instructions));
        body.insert(
            "input".into(),
            Value::Array(request.messages.iter().map(Self::input_item).collect()),
        );
        body.insert(
            "tools".into(),
            Value::Array(request.tools.iter().map(Self::tool).collect()),
        );
        if let Some(choice) = &request.tool_choice {
            body.insert("tool_choice".into(), Self::tool_choice(choice));
        }
        body.insert(
            "parallel_tool_calls".into(),
            json!(request.parallel_tool_calls),
        );
        body.insert("store".into(), json!(false));
        body.insert("stream".into(), json!(true));

        match &request.reasoning {
            Some(reasoning) => {
                body.insert("include".into(), json!([ENCRYPTED_REASONING]));
                body.insert(
                    "reasoning".into(),
                    json!({
                        "effort": reasoning.effort.as_str(),
                        "summary": reasoning.summary.as_str(),
                    }),
                );
            }
            None => {
                body.insert("include".into(), json!([]));
            }
        }

        Value::Object(body)
    }
}
