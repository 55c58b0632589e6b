//! Tool handler contract and result shapes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::host::HostError;

/// Normalized tool-call arguments: parameter name → value.
pub type ToolArguments = serde_json::Map<String, Value>;

// ─── ToolResult ──────────────────────────────────────────────────────────────

/// Outcome of one tool call, always serialized to text before it enters the
/// transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(payload: Value) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Value::Null,
            error: Some(error.into()),
        }
    }
}

// ─── ToolError ───────────────────────────────────────────────────────────────

/// Faults a handler can raise. The router folds every one of them into a
/// `success=false` [`ToolResult`].
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments missing, mistyped, or otherwise unusable.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The host refused or failed the action.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Handler payload could not be serialized.
    #[error("failed to encode tool payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("{tool} failed: {reason}")]
    ExecutionFailed { tool: String, reason: String },
}

// ─── ToolHandler ─────────────────────────────────────────────────────────────

/// Executes one named tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: &ToolArguments) -> Result<ToolResult, ToolError>;
}

/// Deserialize `args` into a handler's typed contract.
///
/// Keys outside `known` are logged and ignored instead of failing the call;
/// a missing or mistyped known key is [`ToolError::InvalidArguments`].
pub fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    args: &ToolArguments,
    known: &[&str],
) -> Result<T, ToolError> {
    let unknown: Vec<&str> = args
        .keys()
        .map(String::as_str)
        .filter(|key| !known.contains(key))
        .collect();
    if !unknown.is_empty() {
        tracing::warn!(tool = %tool, unknown = ?unknown, "ignoring unknown tool arguments");
    }

    let filtered: ToolArguments = args
        .iter()
        .filter(|(key, _)| known.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    serde_json::from_value(Value::Object(filtered)).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct CommandArgs {
        command: String,
    }

    fn args(value: Value) -> ToolArguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_failure_serialization_omits_payload() {
        let json = serde_json::to_value(ToolResult::failure("unknown tool: frobnicate")).unwrap();
        assert_eq!(json, json!({"success": false, "error": "unknown tool: frobnicate"}));
    }

    #[test]
    fn test_success_serialization_omits_error() {
        let json = serde_json::to_value(ToolResult::success(json!({"cores": 8}))).unwrap();
        assert_eq!(json, json!({"success": true, "payload": {"cores": 8}}));
    }

    #[test]
    fn test_parse_arguments_ignores_unknown_keys() {
        let parsed: CommandArgs = parse_arguments(
            "execute_command",
            &args(json!({"command": "dir", "shell": "bash"})),
            &["command"],
        )
        .unwrap();
        assert_eq!(parsed.command, "dir");
    }

    #[test]
    fn test_parse_arguments_missing_key() {
        let err = parse_arguments::<CommandArgs>("execute_command", &ToolArguments::new(), &["command"])
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref tool, .. } if tool == "execute_command"));
        assert!(err.to_string().contains("command"));
    }

    #[test]
    fn test_parse_arguments_wrong_type() {
        let err = parse_arguments::<CommandArgs>(
            "execute_command",
            &args(json!({"command": 42})),
            &["command"],
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
