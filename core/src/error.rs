//! Chat Error Taxonomy
//!
//! Every way a chat turn can fail, as a typed error. Errors are delivered
//! to the consumer either synchronously from [`submit`] (preconditions) or
//! as the single terminal event of the token channel (transport failures).
//! They never cross the component boundary as panics.
//!
//! [`submit`]: crate::session::StreamingChatSession::submit

use thiserror::Error;

/// Errors produced by the streaming chat session and its backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    /// The backend could not be reached before any response byte arrived.
    #[error("cannot reach inference backend at {url}: {reason}")]
    ConnectionUnavailable {
        /// The endpoint that was attempted
        url: String,
        /// Description of the underlying transport error
        reason: String,
    },

    /// The backend was reachable but answered with a non-success status
    /// before streaming began.
    #[error("inference backend returned status {status}")]
    BackendStatus {
        /// The HTTP status code
        status: u16,
    },

    /// The response stream dropped after streaming had started.
    #[error("response stream interrupted: {reason}")]
    TransportInterrupted {
        /// Description of the underlying transport error
        reason: String,
    },

    /// A submission arrived while another response was still streaming.
    #[error("a response is already streaming")]
    SessionBusy,

    /// The submitted message was empty after trimming whitespace.
    #[error("message is empty")]
    EmptyInput,
}

impl ChatError {
    /// Render-ready marker text for the presentation layer.
    ///
    /// Shown in place of the assistant reply that failed to arrive, so a
    /// failed turn occupies a normal message bubble. The text may contain
    /// markup the renderer treats as opaque.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ConnectionUnavailable { url, .. } => format!(
                "**Connection error:** unable to reach the model backend at {url}. \
                 Is the inference server running?"
            ),
            Self::BackendStatus { status } => {
                format!("**Error:** the model backend returned status {status}.")
            }
            Self::TransportInterrupted { .. } => {
                "**Error:** the response stream was interrupted. Please try again.".to_string()
            }
            Self::SessionBusy => {
                "**Busy:** a response is still streaming. Wait for it to finish.".to_string()
            }
            Self::EmptyInput => "**Error:** cannot send an empty message.".to_string(),
        }
    }
}
