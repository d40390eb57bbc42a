//! Helpers for UI-shaped conversation messages.
//!
//! Messages are plain JSON values of the form
//! `{"role": "...", "parts": [{"type": "text", "text": "..."}], "metadata": {...}}`.

use serde_json::{Map, Value};

/// The text of every `text` part of a message, in order.
pub fn text_parts(message: &Value) -> Vec<&str> {
    message
        .get("parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// The text parts of a message concatenated and trimmed.
pub fn text_content(message: &Value) -> String {
    text_parts(message).concat().trim().to_owned()
}

/// The last message with the given role whose metadata contains every entry
/// of `metadata`.
pub fn find_last_message<'a>(
    messages: &'a [Value],
    role: Option<&str>,
    metadata: Option<&Map<String, Value>>,
) -> Option<&'a Value> {
    messages.iter().rev().find(|message| {
        let role_matches =
            role.is_none_or(|role| message.get("role").and_then(Value::as_str) == Some(role));
        let metadata_matches = metadata.is_none_or(|wanted| {
            let actual = message.get("metadata");
            wanted
                .iter()
                .all(|(key, value)| actual.and_then(|m| m.get(key)) == Some(value))
        });
        role_matches && metadata_matches
    })
}

/// The last message with the given role.
pub fn find_last_message_with_role<'a>(messages: &'a [Value], role: &str) -> Option<&'a Value> {
    find_last_message(messages, Some(role), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conversation() -> Vec<Value> {
        vec![
            json!({"role": "user", "parts": [{"type": "text", "text": " hello "}]}),
            json!({"role": "assistant", "parts": [{"type": "text", "text": "hi"}], "metadata": {"agent": "greeter"}}),
            json!({"role": "user", "parts": [
                {"type": "text", "text": "first"},
                {"type": "file", "url": "x"},
                {"type": "text", "text": "second"}
            ]}),
        ]
    }

    #[test]
    fn test_text_content_skips_other_parts() {
        let messages = conversation();
        assert_eq!(text_parts(&messages[2]), vec!["first", "second"]);
        assert_eq!(text_content(&messages[0]), "hello");
        assert_eq!(text_content(&json!({"role": "user"})), "");
    }

    #[test]
    fn test_find_last_message() {
        let messages = conversation();
        let last_user = find_last_message_with_role(&messages, "user").unwrap();
        assert_eq!(text_content(last_user), "firstsecond");

        let mut wanted = Map::new();
        wanted.insert("agent".into(), json!("greeter"));
        let tagged = find_last_message(&messages, None, Some(&wanted)).unwrap();
        assert_eq!(tagged["role"], "assistant");

        assert!(find_last_message_with_role(&messages, "system").is_none());
    }
}
