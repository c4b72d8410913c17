//! Conversation History
//!
//! The ordered, role-tagged message log that forms the context sent to the
//! backend on every request. The history is append-only between resets: a
//! message is never mutated or individually removed once recorded.
//!
//! # Design Philosophy
//!
//! The history itself is a plain single-threaded value. Callers that share
//! it across tasks (the session does) wrap it in a lock and take whole-log
//! snapshots for reads, so a reader never observes a half-applied update.
//! The system prompt is owned by the history: it is seeded at construction,
//! survives every reset, and is the only system-role entry the log can
//! contain.

use serde::{Deserialize, Serialize};

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The seeded system prompt
    System,
    /// User input
    User,
    /// Model-generated reply
    Assistant,
}

impl Role {
    /// Wire-format name of the role
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single recorded message, immutable once appended
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: Role,
    /// Message content
    pub content: String,
    /// When the message was created (Unix timestamp ms)
    pub timestamp: u64,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: now_ms(),
        }
    }
}

/// The conversation log sent as context on every request
#[derive(Clone, Debug)]
pub struct ConversationHistory {
    /// Messages in conversational order; the first is always the system prompt
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// Create a history seeded with the given system prompt
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(Role::System, system_prompt)],
        }
    }

    /// Append a user message and return its ID
    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        self.push(Role::User, content)
    }

    /// Append an assistant message and return its ID
    pub fn push_assistant(&mut self, content: impl Into<String>) -> MessageId {
        self.push(Role::Assistant, content)
    }

    fn push(&mut self, role: Role, content: impl Into<String>) -> MessageId {
        let msg = Message::new(role, content);
        let id = msg.id.clone();
        self.messages.push(msg);
        id
    }

    /// Point-in-time copy of all messages, in conversational order
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Borrow all messages
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of recorded messages (including the system prompt)
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True only before the system seed exists, which never happens through
    /// the public constructors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the entire log with a single system message.
    ///
    /// The sequence is swapped wholesale rather than edited in place, so a
    /// snapshot taken before the reset stays internally consistent.
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        self.messages = vec![Message::new(Role::System, system_prompt)];
        tracing::debug!("conversation history reset");
    }
}

/// Get current timestamp in milliseconds
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
