//! Token Events
//!
//! Events delivered from the streaming worker to the consumer. These are
//! the session's entire output surface: the presentation layer renders
//! what arrives here and nothing else.
//!
//! # Ordering Contract
//!
//! Events for one submission arrive strictly in wire order over a bounded
//! channel. The terminal event ([`TokenEvent::Done`] or
//! [`TokenEvent::Failed`]) is always the last event of the submission;
//! after it the channel closes.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::error::ChatError;

/// Unique identifier for one streaming submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StreamId(pub Uuid);

impl StreamId {
    /// Create a new unique stream ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Lifecycle of the session's current (or last) submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// No submission has started, or the session was reset
    Idle,
    /// Request dispatched, waiting for the first byte or status
    Connecting,
    /// Response bytes are arriving
    Streaming,
    /// Last submission finished cleanly
    Completed,
    /// Last submission terminated with an error
    Failed,
    /// Last submission was cancelled by the consumer
    Cancelled,
}

impl SessionStatus {
    /// Whether a submission is currently in flight
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }

    /// Whether the status describes a finished submission
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// An event on the token channel of one submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenEvent {
    /// The next content delta, in wire order
    Token {
        /// The delta text
        text: String,
    },
    /// The stream ended cleanly (terminal)
    Done {
        /// The full reply: the concatenation of every delta emitted
        message: String,
    },
    /// The stream terminated with an error (terminal)
    Failed {
        /// What went wrong
        error: ChatError,
        /// Render-ready marker text shown in place of the reply
        text: String,
    },
}

impl TokenEvent {
    /// Whether this is the last event of the submission
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. })
    }

    /// The displayable text carried by this event, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Token { text } | Self::Failed { text, .. } => Some(text),
            Self::Done { .. } => None,
        }
    }
}

/// Receiving half of a submission's token channel.
///
/// The channel is bounded, so a stalled consumer applies backpressure to
/// the streaming worker instead of buffering without limit. Dropping the
/// receiver abandons the stream; the worker stops on its next send.
#[derive(Debug)]
pub struct TokenReceiver {
    rx: mpsc::Receiver<TokenEvent>,
}

impl TokenReceiver {
    pub(crate) fn new(rx: mpsc::Receiver<TokenEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event. Returns `None` once the channel closes
    /// after the terminal event.
    pub async fn recv(&mut self) -> Option<TokenEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll for the next event, for consumers driving their
    /// own frame loop.
    pub fn try_recv(&mut self) -> Result<TokenEvent, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }

    /// Adapt the receiver into a [`futures::Stream`] of events.
    ///
    /// [`futures::Stream`]: futures::Stream
    #[must_use]
    pub fn into_stream(self) -> ReceiverStream<TokenEvent> {
        ReceiverStream::new(self.rx)
    }
}
