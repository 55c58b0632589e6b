//! Backend connection settings.
//!
//! Passed explicitly to [`OllamaClient::new`](super::OllamaClient::new);
//! loaded as the `backend` section of the application config.

use std::time::Duration;

use serde::Deserialize;

use super::types::SamplingOptions;

/// Where the model backend lives and how long a round trip may take.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Ollama server, without the `/api` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when the caller does not name one.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Fixed per-round-trip timeout, streaming body reads included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub options: SamplingOptions,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "qwen3:8b".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            options: SamplingOptions::default(),
        }
    }
}

impl BackendConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `base_url` joined with an API path, tolerating a trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_fills_defaults() {
        let config: BackendConfig =
            serde_yaml::from_str("default_model: llama3.2:3b\n").unwrap();
        assert_eq!(config.default_model, "llama3.2:3b");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.options, SamplingOptions::default());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:11434/".into(),
            ..BackendConfig::default()
        };
        assert_eq!(config.endpoint("/api/chat"), "http://127.0.0.1:11434/api/chat");
        assert_eq!(config.endpoint("api/tags"), "http://127.0.0.1:11434/api/tags");
    }
}
