//! Chat Backend Abstraction
//!
//! The seam between the session and the inference server. [`ChatBackend`]
//! is the provider-agnostic trait; [`OllamaBackend`] is the shipped
//! implementation speaking Ollama's streaming chat protocol.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaBackend;
pub use traits::{ChatBackend, ChatRequest, RequestMessage, StreamingToken};
