use crawlx_core::ConsoleError;
use serde_json::Value;

const MAX_BODY_MESSAGE: usize = 300;

/// Normalizes a non-2xx response into a single `ConsoleError::Service`.
///
/// Message precedence: the first usable JSON `detail`, `message` or `error`
/// (a string, or a list of strings or `{msg}` objects), then the trimmed
/// body for non-JSON responses, then the reason phrase. A JSON body without
/// a usable message never leaks into the user-facing text.
pub fn service_error(status: u16, reason: Option<&str>, body: &[u8]) -> ConsoleError {
    let message = match serde_json::from_slice::<Value>(body) {
        Ok(value) => message_from_json(&value),
        Err(_) => text_body(body),
    }
    .unwrap_or_else(|| reason.unwrap_or("request failed").to_string());
    ConsoleError::Service { status, message }
}

fn message_from_json(value: &Value) -> Option<String> {
    match value {
        Value::Object(fields) => ["detail", "message", "error"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(message_from_value)),
        other => message_from_value(other),
    }
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => non_blank(text),
        Value::Object(fields) => fields.get("msg").and_then(Value::as_str).and_then(non_blank),
        Value::Array(entries) => {
            let messages: Vec<String> = entries.iter().filter_map(message_from_value).collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn text_body(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut end = text.len().min(MAX_BODY_MESSAGE);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(text[..end].to_string())
}
