//! Tool output summaries for persisted history.
//!
//! Full tool payloads go back to the caller for the current turn, but only a
//! short synopsis is written into session history so the model context stays
//! bounded over long sessions.

use serde_json::Value;

use super::message::{ChatMessage, Role};
use crate::okx::registry::is_success_envelope;

const SAMPLE_CHARS: usize = 100;
const ERROR_PREFIX_CHARS: usize = 250;
const BRIEF_CHARS: usize = 150;
const RAW_BRIEF_CHARS: usize = 200;
const MAX_KEYS: usize = 3;

/// Return the first `max` characters of `s` without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Shrink a tool result to a one-line synopsis.
pub fn summarize_tool_output(name: &str, content: &str) -> String {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(_) => return summarize_raw(name, content),
    };

    let mut summary = format!("Tool {} executed. ", name);
    let data = json.get("data").filter(|d| is_present(d));

    if let (true, Some(data)) = (is_success_envelope(&json), data) {
        match data {
            Value::Array(items) => {
                summary.push_str(&format!("Successfully returned {} items.", items.len()));
                if let Some(first) = items.first() {
                    let sample = first.to_string();
                    summary.push_str(&format!(" (Sample: {}...)", truncate_chars(&sample, SAMPLE_CHARS)));
                }
            }
            Value::Object(map) => {
                // insertion order, via serde_json's preserve_order
                let keys: Vec<&str> = map.keys().take(MAX_KEYS).map(String::as_str).collect();
                summary.push_str(&format!("Successfully returned data object. (Keys: {}...)", keys.join(", ")));
            }
            _ => summary.push_str("Execution successful, data present."),
        }
    } else if let Some(code) = failure_code(&json) {
        let msg = json
            .get("msg")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("No details.");
        summary.push_str(&format!("Execution failed with code {}: {}", code, msg));
    } else {
        summary.push_str(&format!("Output (brief): {}...", truncate_chars(content, BRIEF_CHARS)));
    }

    summary
}

/// Non-JSON content: usually an error string produced at the tool boundary.
fn summarize_raw(name: &str, content: &str) -> String {
    if content.to_lowercase().starts_with("error executing") {
        let prefix = truncate_chars(content, ERROR_PREFIX_CHARS);
        if prefix.len() < content.len() {
            format!("{}...", prefix)
        } else {
            prefix.to_string()
        }
    } else {
        format!("Tool {} output (brief): {}...", name, truncate_chars(content, RAW_BRIEF_CHARS))
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// The envelope code when it is set and not zero.
fn failure_code(json: &Value) -> Option<String> {
    match json.get("code")? {
        Value::String(code) if !code.is_empty() && code != "0" => Some(code.clone()),
        Value::Number(code) if code.as_i64() != Some(0) => Some(code.to_string()),
        _ => None,
    }
}

/// Copy of `message` suitable for persisted history.
pub fn summarize_for_history(message: &ChatMessage) -> ChatMessage {
    match (&message.role, &message.name) {
        (Role::Tool, Some(name)) if message.tool_call_id.is_some() => ChatMessage {
            content: summarize_tool_output(name, &message.content),
            ..message.clone()
        },
        _ => message.clone(),
    }
}
