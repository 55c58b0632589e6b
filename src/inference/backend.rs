//! The seam between the orchestrator and a model backend.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::errors::InferenceError;
use super::types::{ChatMessage, ToolDefinition};

/// Lazy sequence of content fragments from a streamed round trip.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, InferenceError>> + Send>>;

/// A chat-completion backend.
///
/// Each call is one round trip. Implementations never retry; a failed round
/// trip is reported once and the caller decides what the user sees.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Single non-streaming round trip.
    ///
    /// `tools` is `Some` only on the first round of a turn.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatMessage, InferenceError>;

    /// Streaming round trip without tools.
    ///
    /// Connection and status errors surface here; decode faults inside the
    /// stream are skipped by the implementation.
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<FragmentStream, InferenceError>;
}
