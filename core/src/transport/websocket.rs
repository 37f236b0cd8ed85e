//! WebSocket Channel
//!
//! Client-side WebSocket implementation of the [`Channel`] contract. Each
//! event crosses the wire as one JSON text frame (`WireFrame`).
//!
//! After `connect`, two background tasks own the split stream: a writer
//! draining the outbound queue into the sink, and a reader dispatching
//! inbound frames to the handler registry. Connection loss flips the shared
//! connected flag and is otherwise silent: sends become no-ops and no
//! reconnection is attempted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::events::WireFrame;

use super::traits::{Channel, ChannelError, EventHandler, HandlerRegistry};

/// WebSocket transport channel
pub struct WebSocketChannel {
    /// Remote endpoint, e.g. `ws://127.0.0.1:3000/`
    endpoint: String,
    /// Handler table shared with the reader task
    handlers: HandlerRegistry,
    /// Connection state shared with both tasks
    connected: Arc<AtomicBool>,
    /// Terminal closed flag (a closed channel never reconnects)
    closed: bool,
    /// Outbound frame queue feeding the writer task
    outbound_tx: Option<mpsc::UnboundedSender<WireFrame>>,
    /// Reader task handle, aborted on close
    reader: Option<JoinHandle<()>>,
}

impl WebSocketChannel {
    /// Create an unconnected channel for the given endpoint
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            handlers: HandlerRegistry::new(),
            connected: Arc::new(AtomicBool::new(false)),
            closed: false,
            outbound_tx: None,
            reader: None,
        }
    }

    /// The configured remote endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Channel for WebSocketChannel {
    async fn connect(&mut self) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::InvalidState("channel closed".to_string()));
        }
        if self.connected.load(Ordering::SeqCst) {
            return Err(ChannelError::InvalidState("already connected".to_string()));
        }

        let (stream, _response) = connect_async(self.endpoint.as_str()).await.map_err(|e| {
            ChannelError::ConnectionFailed(format!(
                "failed to connect to {}: {e}",
                self.endpoint
            ))
        })?;

        // Split for concurrent read/write
        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<WireFrame>();

        let connected = Arc::clone(&self.connected);
        connected.store(true, Ordering::SeqCst);

        // Writer task: outbound queue -> sink
        let connected_write = Arc::clone(&connected);
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                match frame.encode() {
                    Ok(text) => {
                        if let Err(e) = sink.send(WsMessage::Text(text)).await {
                            tracing::warn!(error = %e, "Write error");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Frame encode error");
                    }
                }
            }

            let _ = sink.close().await;
            connected_write.store(false, Ordering::SeqCst);
        });

        // Reader task: source -> handler dispatch
        let handlers = self.handlers.clone();
        let connected_read = Arc::clone(&connected);
        let reader = tokio::spawn(async move {
            while let Some(item) = source.next().await {
                match item {
                    Ok(WsMessage::Text(text)) => match WireFrame::decode(&text) {
                        Ok(frame) => {
                            if !handlers.dispatch(&frame.event, frame.payload) {
                                tracing::debug!(event = %frame.event, "No handler, event dropped");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Frame decode error");
                        }
                    },
                    Ok(WsMessage::Close(_)) => {
                        tracing::debug!("Connection closed by server");
                        break;
                    }
                    // Pings are answered by the library; binary frames are
                    // not part of the protocol.
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Read error");
                        break;
                    }
                }
            }

            connected_read.store(false, Ordering::SeqCst);
            tracing::info!("Disconnected from responder");
        });

        self.outbound_tx = Some(outbound_tx);
        self.reader = Some(reader);

        tracing::info!(endpoint = %self.endpoint, "Connected to responder");
        Ok(())
    }

    fn send(&self, event: &str, payload: Value) {
        if !self.is_connected() {
            tracing::debug!(event, "Send skipped, channel not connected");
            return;
        }

        if let Some(ref tx) = self.outbound_tx {
            if tx.send(WireFrame::new(event, payload)).is_err() {
                tracing::debug!(event, "Writer gone, send dropped");
            }
        }
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

        // Dropping the queue ends the writer task, which closes the sink.
        self.outbound_tx = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        tracing::info!("Channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AI_MESSAGE, AI_RESPONSE};
    use serde_json::json;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut channel = WebSocketChannel::new(format!("ws://{addr}"));
        let result = channel.connect().await;

        assert!(matches!(result, Err(ChannelError::ConnectionFailed(_))));
        assert!(!channel.is_connected());
    }

    #[tokio::test]
    async fn test_send_before_connect_is_noop() {
        let channel = WebSocketChannel::new("ws://127.0.0.1:9");
        // Must not panic, must not error.
        channel.send(AI_MESSAGE, json!("hello"));
        assert!(!channel.is_connected());
    }

    #[tokio::test]
    async fn test_close_idempotent() {
        let mut channel = WebSocketChannel::new("ws://127.0.0.1:9");
        channel.on(AI_RESPONSE, Box::new(|_| {}));
        channel.close();
        channel.close();
        assert!(!channel.is_connected());

        // A closed channel never reconnects.
        let result = channel.connect().await;
        assert!(matches!(result, Err(ChannelError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_roundtrip_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Server: accept one client, read its frame, answer it.
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let msg = ws.next().await.unwrap().unwrap();
            let received = WireFrame::decode(msg.to_text().unwrap()).unwrap();

            let reply = WireFrame::new(AI_RESPONSE, json!({ "response": "pong" }));
            ws.send(WsMessage::Text(reply.encode().unwrap()))
                .await
                .unwrap();

            received
        });

        let mut channel = WebSocketChannel::new(format!("ws://{addr}"));
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        channel.on(
            AI_RESPONSE,
            Box::new(move |payload| {
                let _ = inbound_tx.send(payload);
            }),
        );

        channel.connect().await.unwrap();
        assert!(channel.is_connected());

        channel.send(AI_MESSAGE, json!("ping"));

        let received = server.await.unwrap();
        assert_eq!(received.event, AI_MESSAGE);
        assert_eq!(received.payload, json!("ping"));

        let payload = tokio::time::timeout(Duration::from_secs(1), inbound_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, json!({ "response": "pong" }));

        channel.close();
        assert!(!channel.is_connected());
    }
}
