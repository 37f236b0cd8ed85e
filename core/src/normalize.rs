//! Inbound Payload Normalization
//!
//! The responder may answer with a structured object, a bare string, or any
//! other JSON value. Whatever arrives is coerced to a single displayable
//! string at the boundary, before anything else sees it, so the untyped shape
//! never propagates past this function.
//!
//! Rules:
//! - A JSON object carrying a non-null `response` field: the field's string
//!   value, or the field serialized to JSON when it is not a string.
//! - Any other object, or an array: the whole value serialized to JSON.
//! - A bare string: used as-is.
//! - Anything else (number, bool, null): its textual JSON form.
//!
//! Normalization never fails.

use serde_json::Value;

/// Designated text field on structured responses
const RESPONSE_FIELD: &str = "response";

/// Coerce an arbitrarily shaped inbound payload into display text
#[must_use]
pub fn normalize_payload(payload: &Value) -> String {
    match payload {
        Value::Object(map) => match map.get(RESPONSE_FIELD) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => payload.to_string(),
            Some(other) => other.to_string(),
        },
        Value::Array(_) => payload.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_object_with_response_field() {
        let payload = json!({"response": "hello"});
        assert_eq!(normalize_payload(&payload), "hello");
    }

    #[test]
    fn test_plain_string() {
        let payload = json!("hello");
        assert_eq!(normalize_payload(&payload), "hello");
    }

    #[test]
    fn test_object_without_response_field_serializes_whole() {
        let payload = json!({"foo": 1});
        let text = normalize_payload(&payload);
        assert!(!text.is_empty());
        assert_eq!(text, r#"{"foo":1}"#);
    }

    #[test]
    fn test_null_response_field_serializes_whole() {
        let payload = json!({"response": null, "status": "ok"});
        let text = normalize_payload(&payload);
        assert!(text.contains("status"));
    }

    #[test]
    fn test_non_string_response_field_serializes_field() {
        let payload = json!({"response": 42});
        assert_eq!(normalize_payload(&payload), "42");

        let payload = json!({"response": {"nested": true}});
        assert_eq!(normalize_payload(&payload), r#"{"nested":true}"#);
    }

    #[test]
    fn test_array_serializes_whole() {
        let payload = json!([1, 2, 3]);
        assert_eq!(normalize_payload(&payload), "[1,2,3]");
    }

    #[test]
    fn test_scalar_payloads() {
        assert_eq!(normalize_payload(&json!(42)), "42");
        assert_eq!(normalize_payload(&json!(true)), "true");
        assert_eq!(normalize_payload(&Value::Null), "null");
    }
}
