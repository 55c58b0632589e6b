//! Orchestrator settings, loaded as the `agent` section of the application
//! config.

use serde::Deserialize;

/// Delimiters of a hidden reasoning span in model output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HiddenMarkers {
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_end")]
    pub end: String,
}

fn default_start() -> String {
    "<think>".to_string()
}

fn default_end() -> String {
    "</think>".to_string()
}

impl Default for HiddenMarkers {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
        }
    }
}

/// Tool-calling behavior of the orchestrator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// When false no tools are offered and every turn is plain chat.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub hidden_block: HiddenMarkers,
    /// Cap on one serialized tool result; 0 disables the cap.
    #[serde(default = "default_max_tool_result_chars")]
    pub max_tool_result_chars: usize,
    /// Opening system message of every new session.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_max_tool_result_chars() -> usize {
    6000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            hidden_block: HiddenMarkers::default(),
            max_tool_result_chars: default_max_tool_result_chars(),
            system_prompt: None,
        }
    }
}
