//! Shared types for the inference client.
//!
//! These mirror the Ollama `/api/chat` wire format, used for both request
//! building and response decoding.

use serde::{Deserialize, Serialize};

// ─── Messages ────────────────────────────────────────────────────────────────

/// A single message in the conversation.
///
/// `tool_calls` only appears on assistant messages; `tool_name` only on tool
/// results. Both are skipped when `None` so plain turns serialize exactly as
/// the backend expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant message that requests tool execution.
    ///
    /// Content is empty: the model produced no visible text at this step.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCallWire>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: Some(tool_calls),
            tool_name: None,
        }
    }

    /// Result of one tool call, serialized to text.
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: None,
            tool_name: Some(tool_name.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_name: None,
        }
    }

    /// Tool calls carried by this message (empty for non-assistant messages).
    pub fn requested_tool_calls(&self) -> &[ToolCallWire] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.requested_tool_calls().is_empty()
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

// ─── Tools ───────────────────────────────────────────────────────────────────

/// Tool definition advertised in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub r#type: String,
    pub function: FunctionDefinition,
}

impl ToolDefinition {
    /// Build a `"function"` tool definition.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Function definition within a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Tool call exactly as it travels on the wire.
///
/// `arguments` is kept as a raw JSON value: depending on the backend version
/// it is either an object or a string holding encoded JSON. The orchestrator
/// normalizes it before any handler sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallWire {
    pub function: FunctionCall,
}

/// Function name and arguments inside a wire tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Sampling options forwarded verbatim as the request's `options` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_num_predict() -> u32 {
    512
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            num_predict: default_num_predict(),
        }
    }
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<&'a [ToolDefinition]>,
    pub options: SamplingOptions,
}

// ─── Response ────────────────────────────────────────────────────────────────

/// One response object: the whole body when `stream=false`, one NDJSON line
/// when `stream=true`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponseFrame {
    #[serde(default)]
    pub message: Option<FrameMessage>,
    #[serde(default)]
    pub done: bool,
    /// Set by the backend when generation failed mid-stream.
    #[serde(default)]
    pub error: Option<String>,
}

/// The message part of a response frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallWire>>,
}

impl ChatResponseFrame {
    /// Content delta carried by this frame (empty when absent).
    pub fn content(&self) -> &str {
        self.message.as_ref().map(|m| m.content.as_str()).unwrap_or("")
    }

    /// Convert a complete (non-streamed) response into an assistant message.
    pub fn into_assistant_message(self) -> ChatMessage {
        let message = self.message.unwrap_or_default();
        ChatMessage {
            role: Role::Assistant,
            content: message.content,
            tool_calls: message.tool_calls.filter(|calls| !calls.is_empty()),
            tool_name: None,
        }
    }
}

/// Raw `/api/tags` response shape.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagModel>,
}

/// Model entry from the tags API.
#[derive(Debug, Deserialize)]
pub struct TagModel {
    pub name: String,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
