//! Line rewriting for chat upstreams streamed straight to the client

use bytes::Bytes;
use serde_json::{json, Value};
use tracing::debug;

use super::SseLine;
use crate::canonical::encode::format_sse_done;

/// Rewrite one upstream line for the client, or drop it.
///
/// Chunks gain a default `object` and normalized tool-call deltas; anything
/// that does not parse is forwarded untouched.
pub fn rewrite_line(line: &str) -> Option<Bytes> {
    match SseLine::classify(line) {
        SseLine::Blank | SseLine::Comment => None,
        SseLine::Done => Some(format_sse_done()),
        SseLine::Other(raw) => Some(Bytes::from(format!("{}\n", raw))),
        SseLine::Data(payload) => match serde_json::from_str::<Value>(payload) {
            Ok(mut chunk) => {
                normalize_chunk(&mut chunk);
                Some(Bytes::from(format!("data: {}\n\n", chunk)))
            }
            Err(e) => {
                debug!(error = %e, "Forwarding unparsable stream line verbatim");
                crate::routes::metrics::record_stream_parse_error("passthrough");
                Some(Bytes::from(format!("{}\n", line)))
            }
        },
    }
}

fn normalize_chunk(chunk: &mut Value) {
    let Some(object) = chunk.as_object_mut() else {
        return;
    };

    let needs_object = !object
        .get("object")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if needs_object {
        object.insert("object".into(), json!("chat.completion.chunk"));
    }

    let Some(choices) = object.get_mut("choices").and_then(Value::as_array_mut) else {
        return;
    };

    for choice in choices {
        let Some(calls) = choice
            .get_mut("delta")
            .and_then(|d| d.get_mut("tool_calls"))
            .and_then(Value::as_array_mut)
        else {
            continue;
        };

        for call in calls.iter_mut() {
            *call = normalize_tool_call(call);
        }
    }
}

fn normalize_tool_call(call: &Value) -> Value {
    let index = match call.get("index") {
        Some(index) if !index.is_null() => index.clone(),
        _ => json!(0),
    };
    let call_type = call
        .get("type")
        .filter(|t| t.as_str().is_some_and(|s| !s.is_empty()))
        .cloned()
        .unwrap_or_else(|| json!("function"));
    let function = call
        .get("function")
        .filter(|f| !f.is_null())
        .cloned()
        .unwrap_or_else(|| json!({}));

    let mut out = serde_json::Map::new();
    out.insert("index".into(), index);
    if let Some(id) = call.get("id").filter(|id| !id.is_null()) {
        out.insert("id".into(), id.clone());
    }
    out.insert("type".into(), call_type);
    out.insert("function".into(), function);
    Value::Object(out)
}
