//! Application configuration loaded from `localai.yaml`.
//!
//! Lookup order:
//! 1. `LOCALAI_CONFIG` (path to the file)
//! 2. `localai.yaml` in the start directory or any parent
//!
//! A missing file is not an error: every field has a default. String values
//! may reference environment variables as `${VAR}` or `${VAR:-default}`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::agent_core::AgentConfig;
use crate::host::HostConfig;
use crate::inference::BackendConfig;

/// File name searched for when `LOCALAI_CONFIG` is unset.
pub const CONFIG_FILE_NAME: &str = "localai.yaml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LOCALAI_CONFIG";

// ─── Types ───────────────────────────────────────────────────────────────────

/// Errors from loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Top-level config file shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub system: HostConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log file placement and verbosity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Defaults to `<data_dir>/logs`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Daily log files kept on startup; older ones are deleted.
    #[serde(default = "default_keep_files")]
    pub keep_files: usize,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Write the log file as JSON lines instead of plain text.
    #[serde(default)]
    pub json: bool,
}

fn default_keep_files() -> usize {
    7
}

fn default_filter() -> String {
    "localai_desktop=info,warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            keep_files: default_keep_files(),
            filter: default_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Reject settings that would make the system misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_string(),
            })
        };

        if self.backend.base_url.trim().is_empty() {
            return invalid("backend.base_url is empty");
        }
        if self.backend.default_model.trim().is_empty() {
            return invalid("backend.default_model is empty");
        }
        if self.backend.connect_timeout_secs == 0 || self.backend.request_timeout_secs == 0 {
            return invalid("backend timeouts must be greater than zero");
        }
        if self.agent.hidden_block.start.is_empty() || self.agent.hidden_block.end.is_empty() {
            return invalid("agent.hidden_block markers must not be empty");
        }
        if self.system.command_timeout_secs == 0 {
            return invalid("system.command_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file, if any.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&explicit));
        if candidate.is_file() {
            return Some(candidate);
        }
        tracing::warn!(path = %candidate.display(), "{CONFIG_ENV_VAR} points to a missing file");
    }

    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load, interpolate, parse and validate a config file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let interpolated = interpolate_env_vars(&raw);

    // An empty file parses as null; treat it as all-defaults
    let mut config: AppConfig = if interpolated.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml::from_str(&interpolated).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    if let Some(dir) = &config.logging.directory {
        config.logging.directory = Some(PathBuf::from(expand_tilde(&dir.to_string_lossy())));
    }

    config.validate()?;
    Ok(config)
}

/// Find and load the config, falling back to defaults when there is none.
///
/// Returns the path that was loaded, if any.
pub fn load_or_default(start: &Path) -> Result<(AppConfig, Option<PathBuf>), ConfigError> {
    match find_config_path(start) {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => Ok((AppConfig::default(), None)),
    }
}

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                result.push_str(&resolve_var_expr(&after[..end]));
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated: keep verbatim
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}

fn resolve_var_expr(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((name, default)) => std::env::var(name).unwrap_or_else(|_| expand_tilde(default)),
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_interpolate_with_default() {
        std::env::remove_var("__LOCALAI_TEST_UNSET__");
        assert_eq!(
            interpolate_env_vars("url: ${__LOCALAI_TEST_UNSET__:-http://127.0.0.1:11434}"),
            "url: http://127.0.0.1:11434"
        );
    }

    #[test]
    fn test_interpolate_with_value() {
        std::env::set_var("__LOCALAI_TEST_MODEL__", "llama3.2:3b");
        assert_eq!(
            interpolate_env_vars("model: ${__LOCALAI_TEST_MODEL__:-qwen3:8b}"),
            "model: llama3.2:3b"
        );
        std::env::remove_var("__LOCALAI_TEST_MODEL__");
    }

    #[test]
    fn test_interpolate_unterminated_kept() {
        assert_eq!(interpolate_env_vars("a ${OOPS"), "a ${OOPS");
        assert_eq!(interpolate_env_vars("no vars"), "no vars");
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), format!("{}/logs", home.display()));
        }
        assert_eq!(expand_tilde("/abs"), "/abs");
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            "backend:\n  default_model: qwen3-vl:8b\nagent:\n  enabled: false\nsystem:\n  allowed_commands: [echo]\n",
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backend.default_model, "qwen3-vl:8b");
        assert_eq!(config.backend.base_url, "http://localhost:11434");
        assert!(!config.agent.enabled);
        assert_eq!(config.agent.hidden_block.start, "<think>");
        assert_eq!(config.system.allowed_commands, vec!["echo"]);
        assert_eq!(config.logging.keep_files, 7);
        assert_eq!(config.agent.system_prompt, None);
    }

    #[test]
    fn test_load_system_prompt() {
        let file = write_config("agent:\n  system_prompt: \"You run on the user's desktop.\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.agent.system_prompt.as_deref(), Some("You run on the user's desktop."));
    }

    #[test]
    fn test_load_empty_file_is_default() {
        let file = write_config("");
        assert_eq!(load_config(file.path()).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let file = write_config("backend: [unclosed\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_markers() {
        let file = write_config("agent:\n  hidden_block:\n    start: \"\"\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.backend.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_find_config_walks_upward() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(CONFIG_FILE_NAME), "{}\n").unwrap();

        // Only meaningful when the env override is not set in the test environment
        if std::env::var(CONFIG_ENV_VAR).is_err() {
            assert_eq!(find_config_path(&nested), Some(root.path().join(CONFIG_FILE_NAME)));
        }
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config(Path::new("/definitely/not/here/localai.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
