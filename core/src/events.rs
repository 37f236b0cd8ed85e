//! Wire Events
//!
//! The two event kinds crossing the transport channel, and the JSON envelope
//! that carries them. The event names are part of the wire contract with the
//! remote responder; changing them breaks the protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound event: the raw user-entered text, as a single JSON string
pub const AI_MESSAGE: &str = "ai-message";

/// Inbound event: the responder's answer, as an arbitrary JSON value
pub const AI_RESPONSE: &str = "ai-response";

/// One named, payload-carrying event on the wire
///
/// Carried as a single JSON text frame: `{"event": ..., "payload": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    /// Event name (wire contract)
    pub event: String,
    /// Event payload
    pub payload: Value,
}

impl WireFrame {
    /// Create a frame for an arbitrary event
    #[must_use]
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// Build the outbound frame carrying a user message
    #[must_use]
    pub fn user_message(text: &str) -> Self {
        Self::new(AI_MESSAGE, Value::String(text.to_owned()))
    }

    /// Serialize to the wire form
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from the wire form
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_frame_roundtrip() {
        let frame = WireFrame::new(AI_RESPONSE, json!({"response": "hi"}));
        let raw = frame.encode().unwrap();
        let decoded = WireFrame::decode(&raw).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_user_message_frame() {
        let frame = WireFrame::user_message("hello");
        assert_eq!(frame.event, AI_MESSAGE);
        assert_eq!(frame.payload, json!("hello"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(WireFrame::decode("not json").is_err());
        assert!(WireFrame::decode(r#"{"event": 3}"#).is_err());
    }
}
