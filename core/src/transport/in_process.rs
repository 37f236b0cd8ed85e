//! In-Process Channel
//!
//! A [`Channel`] backed by shared state instead of a socket, for embedding a
//! local responder and for deterministic tests. The paired [`InProcessRemote`]
//! plays the other side of the wire: it can inject inbound events (dispatched
//! synchronously, like one event-loop turn) and observe every frame the
//! channel published.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::events::WireFrame;

use super::traits::{Channel, ChannelError, EventHandler, HandlerRegistry};

/// In-process transport channel
pub struct InProcessChannel {
    handlers: HandlerRegistry,
    connected: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<WireFrame>>>,
    closed: bool,
}

/// The remote side of an in-process channel pair
#[derive(Clone)]
pub struct InProcessRemote {
    handlers: HandlerRegistry,
    connected: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<WireFrame>>>,
}

impl InProcessChannel {
    /// Create a channel pair
    ///
    /// The channel starts disconnected; `connect` brings it up.
    #[must_use]
    pub fn pair() -> (Self, InProcessRemote) {
        let handlers = HandlerRegistry::new();
        let connected = Arc::new(AtomicBool::new(false));
        let sent = Arc::new(Mutex::new(Vec::new()));

        let channel = Self {
            handlers: handlers.clone(),
            connected: Arc::clone(&connected),
            sent: Arc::clone(&sent),
            closed: false,
        };
        let remote = InProcessRemote {
            handlers,
            connected,
            sent,
        };

        (channel, remote)
    }
}

#[async_trait]
impl Channel for InProcessChannel {
    async fn connect(&mut self) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::InvalidState("channel closed".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn send(&self, event: &str, payload: Value) {
        if !self.is_connected() {
            tracing::debug!(event, "Send skipped, channel not connected");
            return;
        }
        self.sent.lock().push(WireFrame::new(event, payload));
    }

    fn on(&mut self, event: &str, handler: EventHandler) {
        self.handlers.register(event, handler);
    }

    fn off(&mut self, event: &str) {
        self.handlers.unregister(event);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.connected.store(false, Ordering::SeqCst);
        self.handlers.clear();
    }
}

impl InProcessRemote {
    /// Deliver an inbound event to the channel's registered handler
    ///
    /// Dispatches synchronously on the caller's turn. Returns whether a
    /// handler consumed the event; a disconnected channel delivers nothing.
    pub fn emit(&self, event: &str, payload: Value) -> bool {
        if !self.connected.load(Ordering::SeqCst) {
            return false;
        }
        self.handlers.dispatch(event, payload)
    }

    /// Simulate connection state changes (e.g. silent connection loss)
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Frames the channel has published so far
    #[must_use]
    pub fn sent(&self) -> Vec<WireFrame> {
        self.sent.lock().clone()
    }

    /// Drain the published frames
    pub fn take_sent(&self) -> Vec<WireFrame> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AI_MESSAGE, AI_RESPONSE};
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_roundtrip() {
        let (mut channel, remote) = InProcessChannel::pair();
        channel.connect().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.on(
            AI_RESPONSE,
            Box::new(move |payload| {
                let _ = tx.send(payload);
            }),
        );

        channel.send(AI_MESSAGE, json!("hello"));
        assert_eq!(remote.sent(), vec![WireFrame::user_message("hello")]);

        assert!(remote.emit(AI_RESPONSE, json!({ "response": "hi" })));
        assert_eq!(rx.try_recv().unwrap(), json!({ "response": "hi" }));
    }

    #[tokio::test]
    async fn test_send_when_disconnected_is_noop() {
        let (channel, remote) = InProcessChannel::pair();
        // Never connected.
        channel.send(AI_MESSAGE, json!("dropped"));
        assert!(remote.sent().is_empty());
    }

    #[tokio::test]
    async fn test_emit_when_disconnected_delivers_nothing() {
        let (mut channel, remote) = InProcessChannel::pair();
        channel.connect().await.unwrap();
        channel.on(AI_RESPONSE, Box::new(|_| panic!("must not dispatch")));

        remote.set_connected(false);
        assert!(!remote.emit(AI_RESPONSE, json!("lost")));
    }

    #[tokio::test]
    async fn test_close_releases_handlers() {
        let (mut channel, remote) = InProcessChannel::pair();
        channel.connect().await.unwrap();
        channel.on(AI_RESPONSE, Box::new(|_| {}));

        channel.close();
        assert!(!channel.is_connected());

        // Closed channel: nothing dispatched, even if the remote thinks the
        // link is up again.
        remote.set_connected(true);
        assert!(!remote.emit(AI_RESPONSE, json!("late")));

        // Idempotent, and terminal.
        channel.close();
        assert!(matches!(
            channel.connect().await,
            Err(ChannelError::InvalidState(_))
        ));
    }
}
