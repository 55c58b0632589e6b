//! Host capability error types.

use thiserror::Error;

/// Errors raised while acting on the local machine.
///
/// Every variant is recoverable: the tool layer folds it into a
/// `success=false` result instead of aborting the turn.
#[derive(Debug, Error)]
pub enum HostError {
    /// `system.allow_system_control` is off.
    #[error("system control is disabled")]
    ControlDisabled,

    /// Application name is neither whitelisted nor a known alias.
    #[error("application \"{name}\" is not in the allowed list")]
    UnknownApplication { name: String },

    /// Command program is not whitelisted, or the line carries shell
    /// control characters.
    #[error("command \"{command}\" is not in the allowed list")]
    CommandNotAllowed { command: String },

    /// The command did not finish within the configured timeout.
    #[error("command timed out after {timeout_secs}s")]
    CommandTimeout { timeout_secs: u64 },

    /// Process could not be spawned or waited on.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// No screenshot command configured for this platform.
    #[error("screenshot capture is not configured on this system")]
    ScreenshotUnavailable,

    /// Screenshot command ran but produced no image.
    #[error("screenshot capture failed: {reason}")]
    ScreenshotFailed { reason: String },

    /// Metrics collection task failed.
    #[error("failed to collect system metrics: {reason}")]
    Metrics { reason: String },
}
