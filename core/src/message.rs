//! Message Records
//!
//! The canonical record type for one turn of the conversation. Messages are
//! created by the session controller and never mutated afterwards; the
//! conversation store keeps them in insertion order.

use serde::{Deserialize, Serialize};

/// Message identifier
///
/// Unique within a session: creation time in milliseconds plus a 64-bit
/// random tiebreaker, so two messages created in the same millisecond still
/// get distinct ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    #[must_use]
    pub fn new() -> Self {
        use rand::Rng;
        let millis = now_ms();
        let tiebreak: [u8; 8] = rand::thread_rng().gen();
        Self(format!("msg_{millis}_{}", hex::encode(tiebreak)))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The human operator
    User,
    /// The automated responder
    Bot,
}

/// One turn in the conversation
///
/// `text` is the raw, unrendered content; it may contain markdown syntax.
/// The core passes it through unmodified; rendering is the surface's job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Raw message content
    pub text: String,
    /// Human-readable time of day, captured at creation (e.g. "3:07 PM")
    pub timestamp: String,
    /// Who sent this message
    pub sender: Sender,
}

impl Message {
    /// Create a message from the human operator
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text.into(), Sender::User)
    }

    /// Create a message from the automated responder
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text.into(), Sender::Bot)
    }

    fn new(text: String, sender: Sender) -> Self {
        Self {
            id: MessageId::new(),
            text,
            timestamp: clock_time(),
            sender,
        }
    }
}

/// Current local time of day as a short display string
fn clock_time() -> String {
    chrono::Local::now().format("%-I:%M %p").to_string()
}

/// Current timestamp in milliseconds
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
