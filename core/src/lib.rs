//! Parley Core - Conversation Synchronization Engine
//!
//! This crate owns the canonical in-memory message timeline for a real-time
//! chat session, the lifecycle of the transport channel to the remote
//! responder, and the reconciliation of asynchronously arriving responses
//! with the timeline. It is completely independent of any UI framework and
//! can drive a TUI, a desktop surface, or run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Surface (TUI, ...)                    │
//! │        submit / draft edits          rendered timeline    │
//! └───────────────┬──────────────────────────▲───────────────┘
//!                 │                          │
//! ┌───────────────▼──────────────────────────┴───────────────┐
//! │                    SessionController                      │
//! │  ┌───────────────┐  ┌──────────────────┐  ┌────────────┐ │
//! │  │ Conversation  │  │ PendingResponses │  │   Draft    │ │
//! │  │    Store      │  │     tracker      │  │   input    │ │
//! │  └───────────────┘  └──────────────────┘  └────────────┘ │
//! └───────────────┬──────────────────────────▲───────────────┘
//!                 │ ai-message               │ ai-response
//! ┌───────────────▼──────────────────────────┴───────────────┐
//! │               Channel (WebSocket / in-process)            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`SessionController`]: orchestrates the session; owns the channel
//! - [`ConversationStore`]: append-only, ordered message timeline
//! - [`PendingResponses`]: counter driving the typing affordance
//! - [`Channel`]: transport contract (connect, fire-and-forget send,
//!   named-event subscribe, idempotent close)
//! - [`Message`]: one turn of the conversation
//!
//! # Quick Start
//!
//! ```ignore
//! use parley_core::{ChatConfig, SessionController, WebSocketChannel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ChatConfig::load();
//!     let channel = WebSocketChannel::new(config.endpoint);
//!     let mut session = SessionController::new(channel);
//!
//!     if let Err(e) = session.start().await {
//!         // The session still works in local-echo mode.
//!         tracing::warn!(error = %e, "connect failed");
//!     }
//!
//!     session.submit_user_message("Hello!");
//!
//!     loop {
//!         // On each event-loop turn, apply queued responses and render.
//!         session.poll_inbound();
//!         // ... render session.messages(), handle input ...
//!     }
//! }
//! ```
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework. Message text is carried raw and unrendered; markdown
//! rendering is the surface's concern.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod events;
pub mod message;
pub mod normalize;
pub mod pending;
pub mod session;
pub mod store;
pub mod transport;

// Re-exports for convenience
pub use config::{default_config_path, ChatConfig, ConfigError};
pub use events::{WireFrame, AI_MESSAGE, AI_RESPONSE};
pub use message::{Message, MessageId, Sender};
pub use normalize::normalize_payload;
pub use pending::PendingResponses;
pub use session::{SessionController, SessionId, SessionState};
pub use store::ConversationStore;
pub use transport::{
    Channel, ChannelError, EventHandler, HandlerRegistry, InProcessChannel, InProcessRemote,
    WebSocketChannel,
};
