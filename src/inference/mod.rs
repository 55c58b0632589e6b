//! Inference client for the local Ollama backend.
//!
//! This module handles all communication with the model server:
//! - Buffered and streaming `/api/chat` round trips
//! - NDJSON frame decoding
//! - Failure classification into user-facing text
//!
//! The orchestrator only sees the [`ChatBackend`] trait, so tests swap in a
//! scripted backend and a different server is a new impl, not a rewrite.

pub mod backend;
pub mod client;
pub mod config;
pub mod errors;
pub mod streaming;
pub mod types;

// Re-exports for convenience
pub use backend::{ChatBackend, FragmentStream};
pub use client::OllamaClient;
pub use config::BackendConfig;
pub use errors::InferenceError;
pub use types::{ChatMessage, Role, SamplingOptions, ToolCallWire, ToolDefinition};
