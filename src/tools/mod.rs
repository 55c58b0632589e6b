//! Capability registry and the built-in host tools.
//!
//! The orchestrator resolves tool calls by name through [`ToolRegistry`];
//! each [`ToolHandler`] validates its own arguments.

pub mod builtin;
pub mod registry;
pub mod types;

pub use builtin::default_registry;
pub use registry::{RegisteredTool, ToolRegistry};
pub use types::{parse_arguments, ToolArguments, ToolError, ToolHandler, ToolResult};
