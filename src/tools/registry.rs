//! Capability registry: tool name → handler and advertised definition.
//!
//! Built once at startup and shared read-only. Lookup checks existence
//! only; argument validation belongs to each handler.

use std::collections::HashMap;
use std::sync::Arc;

use crate::inference::ToolDefinition;

use super::types::ToolHandler;

/// A registered tool: what the model is told, and what runs.
#[derive(Clone)]
pub struct RegisteredTool {
    pub definition: ToolDefinition,
    pub handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn name(&self) -> &str {
        self.definition.name()
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

// ─── ToolRegistry ────────────────────────────────────────────────────────────

/// Registered tools in registration order, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    /// `tool_name → position in tools`.
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A second registration under the same name replaces
    /// the first, keeping its position.
    pub fn register(&mut self, definition: ToolDefinition, handler: Arc<dyn ToolHandler>) {
        let name = definition.name().to_string();
        let entry = RegisteredTool {
            definition,
            handler,
        };

        match self.index.get(&name) {
            Some(&pos) => {
                tracing::warn!(tool = %name, "replacing previously registered tool");
                self.tools[pos] = entry;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(entry);
            }
        }
    }

    /// Look up a tool by name. Absent is not an error here.
    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&pos| &self.tools[pos])
    }

    /// Definitions advertised to the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(RegisteredTool::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{ToolArguments, ToolError, ToolResult};
    use async_trait::async_trait;
    use serde_json::json;

    struct Fixed(&'static str);

    #[async_trait]
    impl ToolHandler for Fixed {
        async fn call(&self, _args: &ToolArguments) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::success(json!(self.0)))
        }
    }

    fn def(name: &str) -> ToolDefinition {
        ToolDefinition::function(name, "test tool", json!({"type": "object", "properties": {}}))
    }

    #[test]
    fn test_lookup_registered_and_absent() {
        let mut registry = ToolRegistry::new();
        registry.register(def("get_system_info"), Arc::new(Fixed("a")));
        assert!(registry.lookup("get_system_info").is_some());
        assert!(registry.lookup("frobnicate").is_none());
    }

    #[test]
    fn test_definitions_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["b_tool", "a_tool", "c_tool"] {
            registry.register(def(name), Arc::new(Fixed("x")));
        }
        let names: Vec<String> = registry
            .definitions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["b_tool", "a_tool", "c_tool"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_replaces_handler() {
        let mut registry = ToolRegistry::new();
        registry.register(def("t"), Arc::new(Fixed("old")));
        registry.register(def("t"), Arc::new(Fixed("new")));
        assert_eq!(registry.len(), 1);

        let result = registry
            .lookup("t")
            .unwrap()
            .handler
            .call(&ToolArguments::new())
            .await
            .unwrap();
        assert_eq!(result.payload, json!("new"));
    }
}
