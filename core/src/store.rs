//! Conversation Store
//!
//! The ordered, append-only sequence of message records, the single source
//! of truth for what the surface displays.
//!
//! `append` is the only mutator. There is no delete and no update: once a
//! record is inserted its position relative to earlier records never
//! changes. All mutation happens on sequential turns of the session
//! controller's event loop, so the store needs ordering discipline, not
//! locking.

use crate::message::Message;

/// Append-only conversation timeline
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the timeline
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All records, in insertion order
    #[must_use]
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// The most recently appended record
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the timeline is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
