//! ToolRouter: dispatches model tool calls to registered handlers.
//!
//! Every call yields a [`ToolResult`]: unknown tools, argument errors,
//! handler errors and handler panics all become `success=false` results so
//! the transcript always carries one tool message per call.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde_json::json;

use crate::tools::{ToolRegistry, ToolResult};

use super::types::ToolCall;

// ─── ToolRouter ─────────────────────────────────────────────────────────────

/// Resolves tool calls through the registry and renders their results.
pub struct ToolRouter {
    registry: Arc<ToolRegistry>,
    /// 0 means unlimited.
    max_result_chars: usize,
}

impl ToolRouter {
    pub fn new(registry: Arc<ToolRegistry>, max_result_chars: usize) -> Self {
        Self {
            registry,
            max_result_chars,
        }
    }

    /// Dispatch a batch of tool calls strictly in order.
    pub async fn dispatch_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            results.push(self.dispatch_single(call).await);
        }
        results
    }

    /// Run one tool call to completion. Never fails.
    pub async fn dispatch_single(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();

        let Some(tool) = self.registry.lookup(&call.name) else {
            tracing::warn!(tool = %call.name, "model requested an unknown tool");
            return ToolResult::failure(format!("unknown tool: {}", call.name));
        };

        let handler = Arc::clone(&tool.handler);
        let outcome = AssertUnwindSafe(handler.call(&call.arguments))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => ToolResult::failure(e.to_string()),
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(tool = %call.name, reason = %reason, "tool handler panicked");
                ToolResult::failure(format!("{} failed unexpectedly: {reason}", call.name))
            }
        };

        tracing::info!(
            tool = %call.name,
            success = result.success,
            error = result.error.as_deref().unwrap_or(""),
            duration_ms = start.elapsed().as_millis() as u64,
            "tool call finished"
        );
        result
    }

    /// Serialize a result for the transcript, capped at `max_result_chars`.
    pub fn render_result(&self, result: &ToolResult) -> String {
        let text = serde_json::to_string(result).unwrap_or_else(|e| {
            json!({"success": false, "error": format!("failed to encode tool result: {e}")})
                .to_string()
        });
        truncate_chars(text, self.max_result_chars)
    }
}

/// Cut `text` to `max` characters plus a marker; 0 disables the cap.
fn truncate_chars(mut text: String, max: usize) -> String {
    if max == 0 {
        return text;
    }
    let Some((cut, _)) = text.char_indices().nth(max) else {
        return text;
    };
    let omitted = text[cut..].chars().count();
    text.truncate(cut);
    text.push_str(&format!("… [truncated {omitted} characters]"));
    text
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
