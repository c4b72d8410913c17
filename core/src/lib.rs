//! Murmur Core - Headless Streaming Chat for the murmur Desktop Client
//!
//! This crate provides the streaming chat session logic for murmur,
//! completely independent of any UI framework. It can drive a native GUI,
//! a TUI, or run headless for testing/automation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Presentation Layer (external)             │
//! │        renders TokenEvents, forwards user input           │
//! └─────────────┬────────────────────────────▲───────────────┘
//!               │ submit / cancel / reset    │ TokenEvent (channel)
//! ┌─────────────▼────────────────────────────┴───────────────┐
//! │                  StreamingChatSession                     │
//! │  ┌──────────────────┐        ┌─────────────────────────┐  │
//! │  │ Conversation     │        │ ChatBackend             │  │
//! │  │ History          │        │ (Ollama, NDJSON stream) │  │
//! │  └──────────────────┘        └─────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`StreamingChatSession`]: owns the conversation and drives streaming
//! - [`ConversationHistory`]: the role-tagged context log
//! - [`TokenEvent`] / [`TokenReceiver`]: the consumer-facing event surface
//! - [`ChatBackend`] / [`OllamaBackend`]: the inference server seam
//! - [`ChatConfig`]: TOML + environment configuration
//!
//! # Quick Start
//!
//! ```ignore
//! use murmur_core::{load_config, StreamingChatSession, TokenEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = load_config().unwrap_or_default();
//!     let mut session = StreamingChatSession::with_ollama(config);
//!
//!     let mut tokens = session.submit("hello there").unwrap();
//!     while let Some(event) = tokens.recv().await {
//!         match event {
//!             TokenEvent::Token { text } => print!("{text}"),
//!             TokenEvent::Done { .. } => println!(),
//!             TokenEvent::Failed { text, .. } => println!("{text}"),
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: chat backend abstraction (Ollama)
//! - [`config`]: configuration file and environment loading
//! - [`error`]: the chat error taxonomy
//! - [`events`]: token events and session status
//! - [`history`]: conversation history
//! - [`session`]: the streaming chat session manager
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. It's pure
//! session logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod session;

// Re-exports for convenience
pub use backend::{ChatBackend, ChatRequest, OllamaBackend, RequestMessage, StreamingToken};
pub use config::{
    default_config_path, load_config, load_config_from_path, ChatConfig, ConfigError, MurmurToml,
    DEFAULT_SYSTEM_PROMPT,
};
pub use error::ChatError;
pub use events::{SessionStatus, StreamId, TokenEvent, TokenReceiver};
pub use history::{ConversationHistory, Message, MessageId, Role};
pub use session::StreamingChatSession;
