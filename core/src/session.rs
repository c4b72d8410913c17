//! Streaming Chat Session
//!
//! Turns one user utterance into an ordered sequence of incremental text
//! deltas delivered to a consumer, while keeping the conversation history
//! consistent across completion, failure, cancellation, and reset.
//!
//! # Design Philosophy
//!
//! The session is UI-agnostic. It performs all network work on a spawned
//! worker task and hands events to the consumer over a bounded channel, so
//! a rendering thread polling [`TokenReceiver`] is never blocked on socket
//! reads. The conversation history is the only state shared with the
//! worker; every mutation goes through one write lock, and requests carry
//! point-in-time snapshots.
//!
//! # Lifecycle of a submission
//!
//! ```text
//! idle → connecting → streaming → { completed | failed | cancelled } → idle
//! ```
//!
//! At most one submission is in flight per session; a second `submit`
//! while one is streaming is rejected with [`ChatError::SessionBusy`]
//! rather than queued.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{ChatBackend, ChatRequest, OllamaBackend, StreamingToken};
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::events::{SessionStatus, StreamId, TokenEvent, TokenReceiver};
use crate::history::{ConversationHistory, Message};

/// Handle to the worker driving one submission
struct ActiveStream {
    /// Correlation ID for tracing
    id: StreamId,
    /// The spawned worker task
    handle: JoinHandle<()>,
}

/// The streaming chat session manager.
///
/// Owns the conversation history and the connection to the inference
/// backend. Constructed once and held by the presentation layer; there is
/// no process-wide session state.
pub struct StreamingChatSession<B: ChatBackend> {
    /// Configuration (model, system prompt, channel sizing)
    config: ChatConfig,
    /// The inference backend
    backend: Arc<B>,
    /// Conversation history shared with the streaming worker
    history: Arc<RwLock<ConversationHistory>>,
    /// Observable status of the current or last submission
    status: Arc<Mutex<SessionStatus>>,
    /// The in-flight submission, if any
    active: Option<ActiveStream>,
}

impl StreamingChatSession<OllamaBackend> {
    /// Create a session talking to the Ollama backend described by the
    /// configuration
    #[must_use]
    pub fn with_ollama(config: ChatConfig) -> Self {
        let backend = OllamaBackend::from_config(&config);
        Self::new(backend, config)
    }
}

impl<B: ChatBackend + 'static> StreamingChatSession<B> {
    /// Create a session over the given backend, seeding the history with
    /// the configured system prompt
    pub fn new(backend: B, config: ChatConfig) -> Self {
        let history = ConversationHistory::new(config.system_prompt.clone());
        Self {
            config,
            backend: Arc::new(backend),
            history: Arc::new(RwLock::new(history)),
            status: Arc::new(Mutex::new(SessionStatus::Idle)),
            active: None,
        }
    }

    /// Observable status of the current or most recent submission
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    /// Whether a submission is currently in flight
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.active
            .as_ref()
            .map(|active| !active.handle.is_finished())
            .unwrap_or(false)
    }

    /// Point-in-time snapshot of the conversation history
    #[must_use]
    pub fn history(&self) -> Vec<Message> {
        self.history.read().snapshot()
    }

    /// The session configuration
    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Probe the backend for reachability.
    ///
    /// For presentation-layer status indicators; never affects an
    /// in-flight submission.
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    /// Submit a user message and stream back the reply.
    ///
    /// Appends the user message to history, opens the streaming request on
    /// a worker task, and returns the receiving half of the token channel.
    /// Events arrive in wire order; the last event is always terminal. On
    /// clean completion the full reply is appended to history before
    /// [`TokenEvent::Done`] becomes visible. On any failure the history
    /// keeps the user message but never a partial reply.
    ///
    /// # Errors
    ///
    /// [`ChatError::EmptyInput`] if `text` is whitespace-only (history
    /// untouched), [`ChatError::SessionBusy`] if a submission is already
    /// streaming (history untouched).
    ///
    /// # Panics
    ///
    /// Must be called within a Tokio runtime.
    pub fn submit(&mut self, text: &str) -> Result<TokenReceiver, ChatError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if self.is_streaming() {
            return Err(ChatError::SessionBusy);
        }
        self.active = None;

        let stream_id = StreamId::new();

        // Append the user turn and capture the request context under one
        // write lock, so no concurrent reset can interleave.
        let request = {
            let mut history = self.history.write();
            history.push_user(trimmed);
            ChatRequest::from_history(self.config.model.clone(), history.messages())
        };

        tracing::debug!(
            stream = %stream_id,
            model = %request.model,
            context_messages = request.messages.len(),
            "submitting user message"
        );

        *self.status.lock() = SessionStatus::Connecting;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let backend = Arc::clone(&self.backend);
        let history = Arc::clone(&self.history);
        let status = Arc::clone(&self.status);

        let handle = tokio::spawn(async move {
            drive_stream(stream_id, backend, request, history, status, tx).await;
        });

        self.active = Some(ActiveStream {
            id: stream_id,
            handle,
        });

        Ok(TokenReceiver::new(rx))
    }

    /// Cancel the in-flight submission, if any.
    ///
    /// Aborts the worker, which drops the response body and closes the
    /// underlying connection. No partial reply is recorded. Idempotent:
    /// cancelling with nothing in flight, or after natural completion, is
    /// a no-op.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.handle.is_finished() {
                tracing::debug!(stream = %active.id, "cancelling in-flight stream");
                active.handle.abort();
                // A worker that already reached a terminal state keeps it;
                // only an actually-active stream becomes Cancelled.
                let mut status = self.status.lock();
                if status.is_active() {
                    *status = SessionStatus::Cancelled;
                }
            }
        }
    }

    /// Discard the conversation and re-seed it with the original system
    /// prompt.
    ///
    /// Cancels any in-flight submission first, then replaces the history
    /// wholesale. Safe to call at any time, including before the first
    /// submission.
    pub fn reset(&mut self) {
        self.cancel();
        self.history.write().reset(self.config.system_prompt.clone());
        *self.status.lock() = SessionStatus::Idle;
    }
}

impl<B: ChatBackend> Drop for StreamingChatSession<B> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
        }
    }
}

/// Worker driving one submission from request dispatch to terminal event.
///
/// The history append for a completed reply happens under a synchronous
/// lock with no await point inside, so an abort can never leave a
/// half-applied turn behind.
async fn drive_stream<B: ChatBackend + 'static>(
    stream_id: StreamId,
    backend: Arc<B>,
    request: ChatRequest,
    history: Arc<RwLock<ConversationHistory>>,
    status: Arc<Mutex<SessionStatus>>,
    tx: mpsc::Sender<TokenEvent>,
) {
    let mut backend_rx = match backend.send_streaming(&request).await {
        Ok(rx) => rx,
        Err(error) => {
            tracing::warn!(stream = %stream_id, %error, "request failed before streaming");
            *status.lock() = SessionStatus::Failed;
            let text = error.user_message();
            let _ = tx.send(TokenEvent::Failed { error, text }).await;
            return;
        }
    };

    *status.lock() = SessionStatus::Streaming;

    while let Some(token) = backend_rx.recv().await {
        match token {
            StreamingToken::Token(text) => {
                if tx.send(TokenEvent::Token { text }).await.is_err() {
                    // Consumer dropped the channel: treat as cancellation,
                    // discarding the partial reply.
                    tracing::debug!(stream = %stream_id, "consumer went away mid-stream");
                    *status.lock() = SessionStatus::Cancelled;
                    return;
                }
            }

            StreamingToken::Complete { message } => {
                tracing::debug!(
                    stream = %stream_id,
                    reply_bytes = message.len(),
                    "stream completed"
                );
                // Record the turn before the terminal event is observable.
                history.write().push_assistant(message.clone());
                *status.lock() = SessionStatus::Completed;
                let _ = tx.send(TokenEvent::Done { message }).await;
                return;
            }

            StreamingToken::Error(error) => {
                tracing::warn!(stream = %stream_id, %error, "stream failed mid-response");
                *status.lock() = SessionStatus::Failed;
                let text = error.user_message();
                let _ = tx.send(TokenEvent::Failed { error, text }).await;
                return;
            }
        }
    }

    // Backend channel closed without a terminal token: the parse task died.
    let error = ChatError::TransportInterrupted {
        reason: "stream ended without completion".to_string(),
    };
    tracing::warn!(stream = %stream_id, %error, "backend channel closed unexpectedly");
    *status.lock() = SessionStatus::Failed;
    let text = error.user_message();
    let _ = tx.send(TokenEvent::Failed { error, text }).await;
}
