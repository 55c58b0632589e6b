//! Host capabilities: the OS actions the assistant's tools delegate to.
//!
//! The tool layer talks to [`HostControl`]; [`SystemHost`] is the real
//! implementation. Every capability honors the `allow_system_control`
//! switch and returns a typed report or a [`HostError`].

pub mod config;
pub mod errors;
pub mod metrics;
pub mod system;

use async_trait::async_trait;
use serde::Serialize;

pub use config::HostConfig;
pub use errors::HostError;
pub use metrics::SystemMetrics;
pub use system::SystemHost;

/// An application that was started.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub application: String,
    pub command: String,
}

/// Result of a whitelisted command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub return_code: Option<i32>,
}

/// A captured screen image.
#[derive(Debug, Clone, Serialize)]
pub struct Screenshot {
    pub format: String,
    pub size_bytes: usize,
    #[serde(rename = "screenshot")]
    pub data_base64: String,
}

/// OS actions available to tool handlers.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Whitelisted application keys, advertised in the tool schema.
    fn application_names(&self) -> Vec<String>;

    /// Map a key or alias to its whitelisted key.
    fn resolve_application(&self, name: &str) -> Option<String>;

    async fn launch_application(&self, name: &str) -> Result<LaunchReport, HostError>;

    async fn run_command(&self, command: &str) -> Result<CommandOutput, HostError>;

    async fn capture_screenshot(&self) -> Result<Screenshot, HostError>;

    async fn system_metrics(&self) -> Result<SystemMetrics, HostError>;
}
