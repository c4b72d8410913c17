//! Ollama Backend Implementation
//!
//! Streaming chat backend for Ollama (local LLM server).
//!
//! # Ollama API
//!
//! Ollama provides a REST API for:
//! - `/api/chat` - Chat completions with message history
//! - `/api/tags` - List available models (used for health checks)
//!
//! The chat endpoint streams its response as newline-delimited JSON: each
//! line is an independent record optionally carrying the next content
//! delta under `message.content`, plus a `done` flag on the final record.
//! No terminator is guaranteed; end of stream is the server closing the
//! connection.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::traits::{ChatBackend, ChatRequest, StreamingToken};
use crate::config::ChatConfig;
use crate::error::ChatError;

/// Channel capacity between the parse task and the session worker
const TOKEN_CHANNEL_CAPACITY: usize = 100;

/// Ollama backend client
#[derive(Clone)]
pub struct OllamaBackend {
    /// Host address
    host: String,
    /// Port number
    port: u16,
    /// HTTP client
    http_client: reqwest::Client,
}

/// One decoded line of the response stream
#[derive(Debug, Deserialize, PartialEq)]
struct ChatChunk {
    /// The partial assistant message, when the record carries one
    #[serde(default)]
    message: Option<ChunkMessage>,
    /// Whether this is the final record of the response
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend with the default request timeout
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_timeout(host, port, Duration::from_secs(120))
    }

    /// Create a new Ollama backend with an explicit request timeout
    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from a [`ChatConfig`]
    #[must_use]
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::with_timeout(config.host.clone(), config.port, config.request_timeout)
    }

    /// Get the base URL
    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get chat endpoint URL
    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url())
    }

    /// Get tags endpoint URL
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new("localhost", 11434)
    }
}

/// Decode one stream line into a chunk.
///
/// Lines that are not valid JSON records are reported as `None` and must
/// be skipped by the caller: the stream may interleave heartbeat or
/// partial lines, and losing one record is preferable to killing the
/// response.
fn decode_line(line: &str) -> Option<ChatChunk> {
    serde_json::from_str::<ChatChunk>(line).ok()
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }

    async fn send_streaming(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamingToken>, ChatError> {
        let url = self.chat_url();

        let body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::ConnectionUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ChatError::BackendStatus {
                status: response.status().as_u16(),
            });
        }

        let mut stream = response.bytes_stream();
        let (tx, rx) = mpsc::channel(TOKEN_CHANNEL_CAPACITY);

        // Spawn task to decode the newline-delimited response
        tokio::spawn(async move {
            let mut buffer = String::new();
            let mut reply = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx
                            .send(StreamingToken::Error(ChatError::TransportInterrupted {
                                reason: e.to_string(),
                            }))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let Some(record) = decode_line(line) else {
                        tracing::trace!(line, "skipping undecodable stream line");
                        continue;
                    };

                    if let Some(delta) = record.message.map(|m| m.content) {
                        if !delta.is_empty() {
                            reply.push_str(&delta);
                            if tx.send(StreamingToken::Token(delta)).await.is_err() {
                                // Receiver dropped, stop streaming
                                return;
                            }
                        }
                    }

                    if record.done {
                        let _ = tx.send(StreamingToken::Complete { message: reply }).await;
                        return;
                    }
                }
            }

            // Connection closed without a done record: flush any final
            // unterminated line, then complete with what arrived.
            let line = buffer.trim();
            if !line.is_empty() {
                if let Some(record) = decode_line(line) {
                    if let Some(delta) = record.message.map(|m| m.content) {
                        if !delta.is_empty() {
                            reply.push_str(&delta);
                            if tx.send(StreamingToken::Token(delta)).await.is_err() {
                                return;
                            }
                        }
                    }
                } else {
                    tracing::trace!(line, "skipping undecodable trailing line");
                }
            }

            let _ = tx.send(StreamingToken::Complete { message: reply }).await;
        });

        Ok(rx)
    }
}
