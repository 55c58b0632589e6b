//! [`HostControl`] implementation backed by real OS processes.

use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::process::Command;

use super::config::HostConfig;
use super::errors::HostError;
use super::metrics::{collect_metrics, SystemMetrics};
use super::{CommandOutput, HostControl, LaunchReport, Screenshot};

/// Characters that would let a whitelisted program smuggle in a second one.
const SHELL_CONTROL_CHARS: &[char] = &[';', '&', '|', '<', '>', '`', '$', '\n', '\r'];

/// Acts on the machine the process runs on.
pub struct SystemHost {
    config: HostConfig,
}

impl SystemHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    fn ensure_enabled(&self) -> Result<(), HostError> {
        if self.config.allow_system_control {
            Ok(())
        } else {
            Err(HostError::ControlDisabled)
        }
    }

    /// Whitelist check on the program name (first word).
    fn check_command(&self, command: &str) -> Result<(), HostError> {
        let rejected = || HostError::CommandNotAllowed {
            command: command.to_string(),
        };

        let trimmed = command.trim();
        if trimmed.contains(SHELL_CONTROL_CHARS) {
            return Err(rejected());
        }
        let program = trimmed.split_whitespace().next().ok_or_else(rejected)?;
        if self
            .config
            .allowed_commands
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(program))
        {
            Ok(())
        } else {
            Err(rejected())
        }
    }
}

/// `cmd /C` on Windows, `sh -c` elsewhere.
fn shell_command(line: &str) -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    }
    #[cfg(not(target_os = "windows"))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

#[async_trait]
impl HostControl for SystemHost {
    fn application_names(&self) -> Vec<String> {
        self.config.applications.keys().cloned().collect()
    }

    fn resolve_application(&self, name: &str) -> Option<String> {
        self.config.resolve_application(name).map(str::to_string)
    }

    async fn launch_application(&self, name: &str) -> Result<LaunchReport, HostError> {
        self.ensure_enabled()?;

        let key = self
            .config
            .resolve_application(name)
            .ok_or_else(|| HostError::UnknownApplication {
                name: name.to_string(),
            })?;
        let command_line = self.config.applications.get(key).map(String::as_str).unwrap_or(key);

        let mut parts = command_line.split_whitespace();
        let program = parts.next().unwrap_or(key);

        // Detached: the child outlives this call and is never awaited
        Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| HostError::Spawn {
                program: program.to_string(),
                source,
            })?;

        tracing::info!(application = %key, command = %command_line, "application launched");
        Ok(LaunchReport {
            application: key.to_string(),
            command: command_line.to_string(),
        })
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput, HostError> {
        self.ensure_enabled()?;
        if let Err(e) = self.check_command(command) {
            tracing::warn!(command = %command, "rejected command outside the allowed list");
            return Err(e);
        }

        let mut cmd = shell_command(command.trim());
        cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.command_timeout(), cmd.output())
            .await
            .map_err(|_| HostError::CommandTimeout {
                timeout_secs: self.config.command_timeout_secs,
            })?
            .map_err(|source| HostError::Spawn {
                program: command.to_string(),
                source,
            })?;

        tracing::info!(command = %command, status = ?output.status.code(), "command finished");
        Ok(CommandOutput {
            command: command.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            return_code: output.status.code(),
        })
    }

    async fn capture_screenshot(&self) -> Result<Screenshot, HostError> {
        self.ensure_enabled()?;

        let argv = self
            .config
            .screenshot_command
            .as_deref()
            .filter(|argv| !argv.is_empty())
            .ok_or(HostError::ScreenshotUnavailable)?;

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.command_timeout(), cmd.output())
            .await
            .map_err(|_| HostError::CommandTimeout {
                timeout_secs: self.config.command_timeout_secs,
            })?
            .map_err(|source| HostError::Spawn {
                program: argv[0].clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(HostError::ScreenshotFailed {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(HostError::ScreenshotFailed {
                reason: "capture command produced no image data".to_string(),
            });
        }

        let data_base64 = BASE64.encode(&output.stdout);
        // Never log the payload itself
        tracing::info!(bytes = output.stdout.len(), encoded_len = data_base64.len(), "screenshot captured");
        Ok(Screenshot {
            format: "png".to_string(),
            size_bytes: output.stdout.len(),
            data_base64,
        })
    }

    async fn system_metrics(&self) -> Result<SystemMetrics, HostError> {
        self.ensure_enabled()?;
        tokio::task::spawn_blocking(collect_metrics)
            .await
            .map_err(|e| HostError::Metrics {
                reason: e.to_string(),
            })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn host(allowed: &[&str]) -> SystemHost {
        SystemHost::new(HostConfig {
            allowed_commands: allowed.iter().map(|s| s.to_string()).collect(),
            ..HostConfig::default()
        })
    }

    #[test]
    fn test_check_command_matches_program_name() {
        let h = host(&["echo", "dir"]);
        assert!(h.check_command("echo hello").is_ok());
        assert!(h.check_command("DIR").is_ok());
        assert!(h.check_command("rm -rf /").is_err());
        assert!(h.check_command("   ").is_err());
    }

    #[test]
    fn test_check_command_rejects_chaining() {
        let h = host(&["echo"]);
        assert!(h.check_command("echo hi; rm -rf /").is_err());
        assert!(h.check_command("echo hi && whoami").is_err());
        assert!(h.check_command("echo $(whoami)").is_err());
        assert!(h.check_command("echo hi > out.txt").is_err());
    }

    #[tokio::test]
    async fn test_disabled_control_fails_every_capability() {
        let h = SystemHost::new(HostConfig {
            allow_system_control: false,
            ..HostConfig::default()
        });
        assert!(matches!(h.run_command("echo hi").await, Err(HostError::ControlDisabled)));
        assert!(matches!(
            h.launch_application("calc").await,
            Err(HostError::ControlDisabled)
        ));
        assert!(matches!(h.capture_screenshot().await, Err(HostError::ControlDisabled)));
        assert!(matches!(h.system_metrics().await, Err(HostError::ControlDisabled)));
    }

    #[tokio::test]
    async fn test_unknown_application_is_rejected() {
        let err = host(&[]).launch_application("definitely-not-an-app").await.unwrap_err();
        assert!(matches!(err, HostError::UnknownApplication { .. }));
    }

    #[tokio::test]
    async fn test_missing_screenshot_command() {
        let h = SystemHost::new(HostConfig {
            screenshot_command: None,
            ..HostConfig::default()
        });
        assert!(matches!(h.capture_screenshot().await, Err(HostError::ScreenshotUnavailable)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_allowed_command_captures_output() {
        let out = host(&["echo"]).run_command("echo hello").await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.return_code, Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_timeout() {
        let h = SystemHost::new(HostConfig {
            allowed_commands: vec!["sleep".into()],
            command_timeout_secs: 1,
            ..HostConfig::default()
        });
        let err = h.run_command("sleep 5").await.unwrap_err();
        assert!(matches!(err, HostError::CommandTimeout { timeout_secs: 1 }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_screenshot_command_output_is_base64() {
        let h = SystemHost::new(HostConfig {
            screenshot_command: Some(vec!["printf".into(), "PNGDATA".into()]),
            ..HostConfig::default()
        });
        let shot = h.capture_screenshot().await.unwrap();
        assert_eq!(shot.size_bytes, 7);
        assert_eq!(BASE64.decode(&shot.data_base64).unwrap(), b"PNGDATA");
    }
}
