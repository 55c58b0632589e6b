//! Host capability settings, loaded as the `system` section of the
//! application config.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// What the assistant may do on this machine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostConfig {
    /// Master switch. When false every capability fails with
    /// [`HostError::ControlDisabled`](super::HostError::ControlDisabled).
    #[serde(default = "default_true")]
    pub allow_system_control: bool,

    /// Whitelisted application key → launch command line.
    #[serde(default = "default_applications")]
    pub applications: BTreeMap<String, String>,

    /// Friendly name → application key.
    #[serde(default = "default_app_aliases")]
    pub app_aliases: BTreeMap<String, String>,

    /// Programs `execute_command` may run, matched on the first word.
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Argv of a program that writes a PNG screenshot to stdout.
    #[serde(default = "default_screenshot_command")]
    pub screenshot_command: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

fn default_command_timeout_secs() -> u64 {
    10
}

fn default_allowed_commands() -> Vec<String> {
    ["dir", "echo", "type"].iter().map(|s| s.to_string()).collect()
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(target_os = "windows")]
fn default_applications() -> BTreeMap<String, String> {
    to_map(&[
        ("notepad", "notepad.exe"),
        ("calc", "calc.exe"),
        ("cmd", "cmd.exe"),
        ("taskmgr", "taskmgr.exe"),
        ("mspaint", "mspaint.exe"),
        ("explorer", "explorer.exe"),
        ("control", "control.exe"),
        ("powershell", "powershell.exe"),
    ])
}

#[cfg(target_os = "macos")]
fn default_applications() -> BTreeMap<String, String> {
    to_map(&[
        ("calc", "open -a Calculator"),
        ("notepad", "open -a TextEdit"),
        ("terminal", "open -a Terminal"),
        ("finder", "open -a Finder"),
    ])
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_applications() -> BTreeMap<String, String> {
    to_map(&[
        ("calc", "gnome-calculator"),
        ("notepad", "gedit"),
        ("terminal", "x-terminal-emulator"),
        ("files", "xdg-open ."),
        ("monitor", "gnome-system-monitor"),
    ])
}

#[cfg(target_os = "windows")]
fn default_app_aliases() -> BTreeMap<String, String> {
    to_map(&[
        ("calculator", "calc"),
        ("paint", "mspaint"),
        ("file explorer", "explorer"),
        ("control panel", "control"),
        ("task manager", "taskmgr"),
        ("command prompt", "cmd"),
        ("记事本", "notepad"),
        ("计算器", "calc"),
        ("画图", "mspaint"),
        ("资源管理器", "explorer"),
        ("控制面板", "control"),
        ("任务管理器", "taskmgr"),
        ("命令提示符", "cmd"),
    ])
}

#[cfg(not(target_os = "windows"))]
fn default_app_aliases() -> BTreeMap<String, String> {
    to_map(&[
        ("calculator", "calc"),
        ("text editor", "notepad"),
        ("editor", "notepad"),
        ("system monitor", "monitor"),
    ])
}

#[cfg(all(unix, not(target_os = "macos")))]
fn default_screenshot_command() -> Option<Vec<String>> {
    Some(
        ["import", "-window", "root", "png:-"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn default_screenshot_command() -> Option<Vec<String>> {
    None
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            allow_system_control: default_true(),
            applications: default_applications(),
            app_aliases: default_app_aliases(),
            allowed_commands: default_allowed_commands(),
            command_timeout_secs: default_command_timeout_secs(),
            screenshot_command: default_screenshot_command(),
        }
    }
}

impl HostConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Resolve a user- or model-supplied application name to a whitelisted
    /// key. Keys win over aliases; both match case-insensitively.
    pub fn resolve_application(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        if let Some((key, _)) = self
            .applications
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
        {
            return Some(key.as_str());
        }

        let target = self
            .app_aliases
            .iter()
            .find(|(alias, _)| alias.to_lowercase() == wanted)
            .map(|(_, target)| target)?;

        self.applications
            .get_key_value(target)
            .map(|(key, _)| key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HostConfig {
        HostConfig {
            applications: to_map(&[("calc", "calc.exe"), ("notepad", "notepad.exe")]),
            app_aliases: to_map(&[("Calculator", "calc"), ("broken", "missing")]),
            ..HostConfig::default()
        }
    }

    #[test]
    fn test_resolve_by_key_case_insensitive() {
        assert_eq!(config().resolve_application("NotePad"), Some("notepad"));
    }

    #[test]
    fn test_resolve_by_alias() {
        assert_eq!(config().resolve_application(" calculator "), Some("calc"));
    }

    #[test]
    fn test_alias_to_unlisted_app_is_rejected() {
        assert_eq!(config().resolve_application("broken"), None);
        assert_eq!(config().resolve_application("regedit"), None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg: HostConfig = serde_yaml::from_str("allow_system_control: false\n").unwrap();
        assert!(!cfg.allow_system_control);
        assert_eq!(cfg.allowed_commands, vec!["dir", "echo", "type"]);
        assert_eq!(cfg.command_timeout_secs, 10);
        assert!(!cfg.applications.is_empty());
    }
}
