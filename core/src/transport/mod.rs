//! Transport Layer
//!
//! Owns the one live connection to the remote responder and exposes a typed
//! publish/subscribe surface keyed by event name.
//!
//! Two implementations of the [`Channel`] contract:
//! - [`WebSocketChannel`]: the real wire, JSON text frames over WebSocket
//! - [`InProcessChannel`]: a channel pair for embedding and deterministic
//!   tests
//!
//! # Design Philosophy
//!
//! The channel is a thin lifecycle wrapper. Sends are fire-and-forget,
//! connection loss is silent (the connected flag drops and sends become
//! no-ops), and there is no reconnection logic at this layer; callers must
//! not assume any.

pub mod in_process;
pub mod traits;
pub mod websocket;

// Re-exports for convenience
pub use in_process::{InProcessChannel, InProcessRemote};
pub use traits::{Channel, ChannelError, EventHandler, HandlerRegistry};
pub use websocket::WebSocketChannel;
