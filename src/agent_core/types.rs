//! Shared types across the agent core.

use serde_json::Value;

use crate::inference::types::{FunctionCall, ToolCallWire};
use crate::tools::ToolArguments;

/// A tool call with arguments normalized to a map.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: ToolArguments,
}

impl ToolCall {
    /// Normalize a wire tool call. Arguments may be an object or a string of
    /// encoded JSON; anything undecodable becomes an empty map.
    pub fn from_wire(wire: &ToolCallWire) -> Self {
        Self {
            name: wire.function.name.clone(),
            arguments: normalize_arguments(&wire.function.name, &wire.function.arguments),
        }
    }

    /// Back to the wire shape, arguments as an object.
    pub fn to_wire(&self) -> ToolCallWire {
        ToolCallWire {
            function: FunctionCall {
                name: self.name.clone(),
                arguments: Value::Object(self.arguments.clone()),
            },
        }
    }
}

fn normalize_arguments(tool: &str, raw: &Value) -> ToolArguments {
    match raw {
        Value::Object(map) => map.clone(),
        Value::Null => ToolArguments::new(),
        Value::String(text) if text.trim().is_empty() => ToolArguments::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                tracing::warn!(tool = %tool, kind = value_kind(&other), "tool arguments are not an object, using none");
                ToolArguments::new()
            }
            Err(e) => {
                tracing::warn!(tool = %tool, error = %e, "failed to decode tool arguments, using none");
                ToolArguments::new()
            }
        },
        other => {
            tracing::warn!(tool = %tool, kind = value_kind(other), "tool arguments are not an object, using none");
            ToolArguments::new()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(arguments: Value) -> ToolCallWire {
        ToolCallWire {
            function: FunctionCall {
                name: "execute_command".into(),
                arguments,
            },
        }
    }

    #[test]
    fn test_object_arguments_pass_through() {
        let call = ToolCall::from_wire(&wire(json!({"command": "dir"})));
        assert_eq!(call.arguments["command"], "dir");
    }

    #[test]
    fn test_string_arguments_are_decoded() {
        let call = ToolCall::from_wire(&wire(json!("{\"command\": \"echo hi\"}")));
        assert_eq!(call.arguments["command"], "echo hi");
    }

    #[test]
    fn test_undecodable_string_becomes_empty() {
        let call = ToolCall::from_wire(&wire(json!("{command: dir")));
        assert!(call.arguments.is_empty());
        assert_eq!(call.name, "execute_command");
    }

    #[test]
    fn test_non_object_values_become_empty() {
        assert!(ToolCall::from_wire(&wire(json!([1, 2]))).arguments.is_empty());
        assert!(ToolCall::from_wire(&wire(json!("[1, 2]"))).arguments.is_empty());
        assert!(ToolCall::from_wire(&wire(Value::Null)).arguments.is_empty());
    }

    #[test]
    fn test_to_wire_emits_object() {
        let call = ToolCall::from_wire(&wire(json!("{\"command\": \"dir\"}")));
        assert_eq!(call.to_wire().function.arguments, json!({"command": "dir"}));
    }
}
