//! Session Controller
//!
//! Orchestrates the conversation: owns the transport channel for the
//! session's lifetime, translates user submits into store mutations and
//! outbound events, and reconciles asynchronously arriving responses with
//! the timeline.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──start()──▶ Connecting ──▶ Connected ──close()──▶ Closed
//! ```
//!
//! `Closed` is terminal: a new session requires a fresh controller. The
//! controller treats the channel as usable as soon as `connect` returns;
//! there is no explicit "connected" acknowledgment. If the connect attempt
//! failed, the session still works in local-echo mode: submits are recorded
//! but never transmitted, and the pending count stays untouched.
//!
//! # Scheduling
//!
//! All mutation happens through `&mut self` on discrete turns of one event
//! loop. Inbound payloads cross from the transport's reader into this
//! controller through a queue and are applied only on [`poll_inbound`]
//! turns, so store appends, counter updates, and buffer clears never
//! interleave within a logical operation.
//!
//! [`poll_inbound`]: SessionController::poll_inbound

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::{AI_MESSAGE, AI_RESPONSE};
use crate::message::Message;
use crate::normalize::normalize_payload;
use crate::pending::PendingResponses;
use crate::store::ConversationStore;
use crate::transport::{Channel, ChannelError};

/// Unique identifier for a session, carried in log records
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new unique session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form: first 8 chars of the UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Session lifecycle states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state, channel not yet opened
    Disconnected,
    /// Channel connect in flight
    Connecting,
    /// Channel handle held, session live
    Connected,
    /// Terminal: session torn down
    Closed,
}

impl SessionState {
    /// Human-readable description for the status line
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Disconnected => "Offline",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Closed => "Closed",
        }
    }
}

/// The conversation session controller
///
/// Holds the channel handle exclusively for the lifetime of the
/// conversation; it is created on session start and released on session
/// end (or drop, whichever comes first).
pub struct SessionController<C: Channel> {
    /// Session identifier for logging
    id: SessionId,
    /// Lifecycle state
    state: SessionState,
    /// The owned transport channel
    channel: C,
    /// Canonical message timeline
    store: ConversationStore,
    /// Sent-but-unanswered counter
    pending: PendingResponses,
    /// Draft input buffer
    input: String,
    /// Inbound payload queue, fed by the channel handler
    inbound_tx: mpsc::UnboundedSender<Value>,
    inbound_rx: mpsc::UnboundedReceiver<Value>,
}

impl<C: Channel> SessionController<C> {
    /// Create a controller owning an unconnected channel
    pub fn new(channel: C) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            id: SessionId::new(),
            state: SessionState::Disconnected,
            channel,
            store: ConversationStore::new(),
            pending: PendingResponses::new(),
            input: String::new(),
            inbound_tx,
            inbound_rx,
        }
    }

    /// Open the channel and subscribe to responses
    ///
    /// The session reaches `Connected` whether or not the connect attempt
    /// succeeded; on failure the error is returned for the caller to log,
    /// and the session degrades to local echo (`is_connected()` stays
    /// false, sends no-op).
    ///
    /// # Errors
    ///
    /// `InvalidState` when the session has already been started or closed;
    /// otherwise whatever the channel's connect reported.
    pub async fn start(&mut self) -> Result<(), ChannelError> {
        if self.state != SessionState::Disconnected {
            return Err(ChannelError::InvalidState(format!(
                "session already {:?}",
                self.state
            )));
        }

        self.state = SessionState::Connecting;
        tracing::debug!(session = %self.id, "Opening channel");
        let result = self.channel.connect().await;

        let inbound_tx = self.inbound_tx.clone();
        self.channel.on(
            AI_RESPONSE,
            Box::new(move |payload| {
                // Queue for the controller's next poll turn; if the
                // controller is gone the event is simply dropped.
                let _ = inbound_tx.send(payload);
            }),
        );

        self.state = SessionState::Connected;
        result
    }

    /// Submit one user message
    ///
    /// Trimmed-empty input is a silent no-op. Otherwise the trimmed text is
    /// appended to the timeline unconditionally (optimistic local echo) and,
    /// only if the channel is connected, published as an `ai-message` event
    /// with the pending counter incremented.
    pub fn submit_user_message(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }

        self.store.append(Message::user(trimmed));

        if self.channel.is_connected() {
            self.channel.send(AI_MESSAGE, Value::String(trimmed.to_owned()));
            self.pending.increment();
            tracing::debug!(
                session = %self.id,
                pending = self.pending.value(),
                "User message published"
            );
        } else {
            tracing::debug!(session = %self.id, "Channel down, message recorded locally only");
        }
    }

    /// Submit the draft input buffer
    ///
    /// A trimmed-empty draft is a no-op that leaves the buffer untouched.
    /// Otherwise the buffer is cleared unconditionally, whether or not the
    /// send went out, and its text submitted.
    pub fn submit(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.input);
        self.submit_user_message(&raw);
    }

    /// Apply one inbound response payload
    ///
    /// Tolerates any payload shape: normalization always produces some
    /// displayable string. Appends a bot record and decrements the pending
    /// counter, floored at zero.
    pub fn on_inbound_response(&mut self, payload: &Value) {
        let text = normalize_payload(payload);
        self.store.append(Message::bot(text));
        self.pending.decrement_floored();
        tracing::debug!(
            session = %self.id,
            pending = self.pending.value(),
            "Response applied"
        );
    }

    /// Drain queued inbound payloads on this event-loop turn
    ///
    /// Returns how many responses were applied. A closed session applies
    /// nothing.
    pub fn poll_inbound(&mut self) -> usize {
        if self.state == SessionState::Closed {
            return 0;
        }
        let mut applied = 0;
        while let Ok(payload) = self.inbound_rx.try_recv() {
            self.on_inbound_response(&payload);
            applied += 1;
        }
        applied
    }

    /// Tear the session down
    ///
    /// Unsubscribes the response handler before the connection itself is
    /// torn down, so no inbound event can be dispatched against a
    /// controller mid-teardown. Idempotent; `Closed` is terminal.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.channel.off(AI_RESPONSE);
        self.channel.close();
        // Discard anything still queued; nothing lands after teardown.
        while self.inbound_rx.try_recv().is_ok() {}
        self.state = SessionState::Closed;
        tracing::info!(session = %self.id, "Session closed");
    }

    /// Append a character to the draft input
    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    /// Remove the last character of the draft input
    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// The current draft input
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The conversation timeline, in insertion order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.store.all()
    }

    /// Number of sent-but-unanswered messages
    #[must_use]
    pub fn pending_responses(&self) -> u32 {
        self.pending.value()
    }

    /// Whether any response is still outstanding
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.pending.is_waiting()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the underlying channel is live
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// Session identifier
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }
}

impl<C: Channel> Drop for SessionController<C> {
    fn drop(&mut self) {
        // Guaranteed release of the channel and its subscriptions.
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WireFrame;
    use crate::message::Sender;
    use crate::transport::{InProcessChannel, InProcessRemote};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn started() -> (SessionController<InProcessChannel>, InProcessRemote) {
        let (channel, remote) = InProcessChannel::pair();
        let mut controller = SessionController::new(channel);
        controller.start().await.unwrap();
        (controller, remote)
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let (channel, _remote) = InProcessChannel::pair();
        let mut controller = SessionController::new(channel);
        assert_eq!(controller.state(), SessionState::Disconnected);

        controller.start().await.unwrap();
        assert_eq!(controller.state(), SessionState::Connected);
        assert!(controller.is_connected());

        controller.close();
        assert_eq!(controller.state(), SessionState::Closed);
        assert!(!controller.is_connected());

        // Closed is terminal.
        assert!(matches!(
            controller.start().await,
            Err(ChannelError::InvalidState(_))
        ));
        controller.close();
        assert_eq!(controller.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let (mut controller, _remote) = started().await;
        assert!(matches!(
            controller.start().await,
            Err(ChannelError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_then_response() {
        let (mut controller, remote) = started().await;

        controller.submit_user_message("Hello");
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].sender, Sender::User);
        assert_eq!(controller.messages()[0].text, "Hello");
        assert_eq!(controller.pending_responses(), 1);
        assert_eq!(remote.sent(), vec![WireFrame::user_message("Hello")]);

        remote.emit(AI_RESPONSE, json!({ "response": "Hi there" }));
        assert_eq!(controller.poll_inbound(), 1);

        assert_eq!(controller.messages().len(), 2);
        assert_eq!(controller.messages()[1].sender, Sender::Bot);
        assert_eq!(controller.messages()[1].text, "Hi there");
        assert_eq!(controller.pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_two_rapid_submits_one_response() {
        let (mut controller, remote) = started().await;

        controller.submit_user_message("first");
        controller.submit_user_message("second");
        assert_eq!(controller.pending_responses(), 2);

        remote.emit(AI_RESPONSE, json!("an answer"));
        controller.poll_inbound();

        assert_eq!(controller.pending_responses(), 1);
        let senders: Vec<_> = controller.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::User, Sender::Bot]);
    }

    #[tokio::test]
    async fn test_empty_submit_is_noop() {
        let (mut controller, remote) = started().await;

        controller.submit_user_message("");
        controller.submit_user_message("   ");

        assert!(controller.messages().is_empty());
        assert_eq!(controller.pending_responses(), 0);
        assert!(remote.sent().is_empty());
    }

    #[tokio::test]
    async fn test_submit_trims_text() {
        let (mut controller, remote) = started().await;

        controller.submit_user_message("  hi there \n");
        assert_eq!(controller.messages()[0].text, "hi there");
        assert_eq!(remote.sent(), vec![WireFrame::user_message("hi there")]);
    }

    #[tokio::test]
    async fn test_disconnected_submit_records_without_incrementing() {
        let (mut controller, remote) = started().await;
        remote.set_connected(false);

        controller.submit_user_message("hi");

        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].sender, Sender::User);
        assert_eq!(controller.pending_responses(), 0);
        assert!(remote.sent().is_empty());
    }

    #[tokio::test]
    async fn test_draft_buffer_submit() {
        let (mut controller, remote) = started().await;

        for c in "hello".chars() {
            controller.push_input(c);
        }
        controller.backspace();
        assert_eq!(controller.input(), "hell");

        controller.submit();
        assert_eq!(controller.input(), "");
        assert_eq!(controller.messages()[0].text, "hell");
        assert_eq!(remote.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_draft_left_untouched() {
        let (mut controller, _remote) = started().await;

        controller.push_input(' ');
        controller.push_input(' ');
        controller.submit();

        assert_eq!(controller.input(), "  ");
        assert!(controller.messages().is_empty());
    }

    #[tokio::test]
    async fn test_draft_cleared_even_when_send_skipped() {
        let (mut controller, remote) = started().await;
        remote.set_connected(false);

        for c in "offline".chars() {
            controller.push_input(c);
        }
        controller.submit();

        assert_eq!(controller.input(), "");
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_payload_shapes_never_panic() {
        let (mut controller, remote) = started().await;

        remote.emit(AI_RESPONSE, json!({ "response": "plain" }));
        remote.emit(AI_RESPONSE, json!("bare string"));
        remote.emit(AI_RESPONSE, json!({ "foo": 1 }));
        remote.emit(AI_RESPONSE, json!([1, 2]));
        remote.emit(AI_RESPONSE, json!(42));
        remote.emit(AI_RESPONSE, Value::Null);

        assert_eq!(controller.poll_inbound(), 6);
        let texts: Vec<_> = controller.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["plain", "bare string", r#"{"foo":1}"#, "[1,2]", "42", "null"]
        );
        // More responses than sends: floored at zero throughout.
        assert_eq!(controller.pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_append_only_under_interleaving() {
        let (mut controller, remote) = started().await;

        controller.submit_user_message("one");
        remote.emit(AI_RESPONSE, json!("r1"));
        controller.submit_user_message("two");
        controller.submit_user_message("three");
        controller.poll_inbound();
        remote.emit(AI_RESPONSE, json!("r2"));
        controller.poll_inbound();

        let texts: Vec<_> = controller.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three", "r1", "r2"]);
        assert_eq!(controller.pending_responses(), 1);
    }

    #[tokio::test]
    async fn test_close_unsubscribes_before_teardown() {
        let (mut controller, remote) = started().await;

        controller.submit_user_message("hello");
        controller.close();

        // Events arriving against a closed session are dropped, not queued.
        assert!(!remote.emit(AI_RESPONSE, json!("too late")));
        assert_eq!(controller.poll_inbound(), 0);
        assert_eq!(controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_degrades_to_local_echo() {
        use crate::transport::WebSocketChannel;
        use tokio::net::TcpListener;

        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let channel = WebSocketChannel::new(format!("ws://{addr}"));
        let mut controller = SessionController::new(channel);

        assert!(controller.start().await.is_err());
        // The session is still usable: local echo, no pending growth.
        assert_eq!(controller.state(), SessionState::Connected);
        assert!(!controller.is_connected());

        controller.submit_user_message("hi");
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.pending_responses(), 0);
    }

    #[test]
    fn test_drop_releases_channel() {
        tokio_test::block_on(async {
            let (channel, remote) = InProcessChannel::pair();
            let mut controller = SessionController::new(channel);
            controller.start().await.unwrap();
            assert!(remote.emit(AI_RESPONSE, json!("while live")));

            drop(controller);
            // Channel and subscriptions released on drop.
            assert!(!remote.emit(AI_RESPONSE, json!("after drop")));
        });
    }

    #[tokio::test]
    async fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
        assert_eq!(format!("{id1}").len(), 8);
    }
}
