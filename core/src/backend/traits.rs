//! Chat Backend Traits
//!
//! Trait definitions for streaming chat backends. The abstraction lets the
//! session work against any provider speaking a compatible message-based
//! chat API without changing session logic, and lets tests substitute an
//! in-process scripted backend.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::history::Message;

/// A role-tagged message in the wire request body
#[derive(Clone, Debug, Serialize)]
pub struct RequestMessage {
    /// Wire-format role name (`system`, `user`, `assistant`)
    pub role: String,
    /// Message content
    pub content: String,
}

impl From<&Message> for RequestMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

/// A streaming chat completion request
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// Model identifier (backend-specific)
    pub model: String,
    /// Full conversation context, in conversational order
    pub messages: Vec<RequestMessage>,
}

impl ChatRequest {
    /// Build a request carrying a history snapshot
    #[must_use]
    pub fn from_history(model: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            model: model.into(),
            messages: messages.iter().map(RequestMessage::from).collect(),
        }
    }
}

/// Token stream events from a chat backend
#[derive(Clone, Debug)]
pub enum StreamingToken {
    /// The next content delta
    Token(String),
    /// Response completed cleanly
    Complete {
        /// The full reply (concatenation of every delta sent)
        message: String,
    },
    /// The stream terminated with an error
    Error(ChatError),
}

/// Streaming chat backend.
///
/// Implementations perform the blocking network work on their own tasks
/// and hand tokens back over a channel, so callers are never blocked on
/// socket reads.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Get the backend name (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Open a streaming chat request.
    ///
    /// Returns a channel receiver that yields tokens in wire order and
    /// closes after a terminal [`StreamingToken::Complete`] or
    /// [`StreamingToken::Error`].
    ///
    /// # Errors
    ///
    /// [`ChatError::ConnectionUnavailable`] if the backend cannot be
    /// reached, [`ChatError::BackendStatus`] if it answers with a
    /// non-success status before streaming begins.
    async fn send_streaming(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamingToken>, ChatError>;
}
