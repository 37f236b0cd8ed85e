//! Transport Traits
//!
//! The [`Channel`] contract every transport implements, the shared
//! [`HandlerRegistry`] that backs its publish/subscribe surface, and the
//! transport error type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

/// Callback invoked with the payload of a subscribed event
pub type EventHandler = Box<dyn FnMut(Value) + Send>;

/// Errors that can occur during transport operations
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Connection to the remote endpoint failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Channel not in the expected state for the operation
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// IO error from the underlying transport
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Event-name-keyed handler table shared with the transport's reader side
///
/// Exactly one handler per event name: registering a second handler for the
/// same name replaces the first rather than stacking.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<Mutex<HashMap<String, EventHandler>>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name, replacing any existing one
    pub fn register(&self, event: &str, handler: EventHandler) {
        self.handlers.lock().insert(event.to_owned(), handler);
    }

    /// Unregister the handler for an event name
    pub fn unregister(&self, event: &str) {
        self.handlers.lock().remove(event);
    }

    /// Invoke the handler registered for `event`, if any
    ///
    /// Returns whether a handler was invoked. Events with no handler are
    /// dropped by the caller.
    pub fn dispatch(&self, event: &str, payload: Value) -> bool {
        let mut handlers = self.handlers.lock();
        match handlers.get_mut(event) {
            Some(handler) => {
                handler(payload);
                true
            }
            None => false,
        }
    }

    /// Whether a handler is registered for `event`
    #[must_use]
    pub fn is_registered(&self, event: &str) -> bool {
        self.handlers.lock().contains_key(event)
    }

    /// Release all registered handlers
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let events: Vec<String> = self.handlers.lock().keys().cloned().collect();
        f.debug_struct("HandlerRegistry")
            .field("events", &events)
            .finish()
    }
}

/// Transport channel contract
///
/// One live connection to the remote responder, with a named-event
/// publish/subscribe surface. The session controller owns the channel for
/// the lifetime of the conversation; no other component holds a reference.
#[async_trait]
pub trait Channel: Send {
    /// Establish the connection to the endpoint supplied at construction
    async fn connect(&mut self) -> Result<(), ChannelError>;

    /// Publish an event, fire-and-forget
    ///
    /// No delivery acknowledgment, no retry, no error propagation. If the
    /// channel is not connected this is a no-op; callers must check
    /// [`Channel::is_connected`] before mutating state that depends on the
    /// send having happened.
    fn send(&self, event: &str, payload: Value);

    /// Subscribe to an inbound event name, replacing any existing handler
    fn on(&mut self, event: &str, handler: EventHandler);

    /// Unsubscribe from an inbound event name
    fn off(&mut self, event: &str);

    /// Whether the underlying connection is currently live
    fn is_connected(&self) -> bool;

    /// Release all handlers and terminate the connection
    ///
    /// Idempotent: closing an already-closed channel is a no-op.
    fn close(&mut self);
}
