//! Reply extraction from message responses.

use serde_json::Value;

/// Extract the reply text from a send-message response payload.
///
/// Prefers the first `assistant_message`. If there is none, falls back to
/// the content of the last message in the payload, then to an empty reply.
pub fn parse_reply(payload: &Value) -> String {
    let messages = match payload.get("messages").and_then(Value::as_array) {
        Some(messages) => messages,
        None => return String::new(),
    };

    let assistant = messages.iter().find(|m| {
        m.get("message_type").and_then(Value::as_str) == Some("assistant_message")
    });

    assistant
        .or_else(|| messages.last())
        .and_then(content_text)
        .unwrap_or_default()
}

/// Content is either a plain string or a list of typed parts.
fn content_text(message: &Value) -> Option<String> {
    match message.get("content")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            }
        }
        _ => None,
    }
}
