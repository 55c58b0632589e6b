//! Agent core: the turn loop between the user and the model.
//!
//! Submodules:
//! - `orchestrator`: two-round tool-calling turns, buffered and streaming
//! - `tool_router`: dispatches tool calls and renders their results
//! - `think_filter`: strips hidden reasoning spans from streamed output
//! - `conversation`: in-memory history and the per-session store
//! - `types`: normalized tool calls
//! - `config`: orchestrator settings

pub mod config;
pub mod conversation;
pub mod orchestrator;
pub mod think_filter;
pub mod tool_router;
pub mod types;

// Re-exports for convenience
pub use config::{AgentConfig, HiddenMarkers};
pub use conversation::{Conversation, SessionStore};
pub use orchestrator::Orchestrator;
pub use think_filter::ThinkFilter;
pub use tool_router::ToolRouter;
pub use types::ToolCall;
