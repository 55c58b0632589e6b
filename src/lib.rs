pub mod agent_core;
pub mod config;
pub mod host;
pub mod inference;
pub mod tools;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_core::{Orchestrator, SessionStore};
use config::{AppConfig, LoggingConfig};
use host::{HostControl, SystemHost};
use inference::{InferenceError, OllamaClient};

/// Async mutex for types that require `.await` inside their methods.
pub type TokioMutex<T> = tokio::sync::Mutex<T>;

/// Prefix and suffix of daily log file names (`localai_YYYYMMDD.log`).
const LOG_FILE_PREFIX: &str = "localai_";
const LOG_FILE_SUFFIX: &str = ".log";

/// Return the platform-standard data directory for the assistant.
///
/// - macOS: `~/Library/Application Support/localai-desktop/`
/// - Windows: `{FOLDERID_RoamingAppData}\localai-desktop\`
/// - Linux: `$XDG_DATA_HOME/localai-desktop/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.localai/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("localai-desktop");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".localai")
}

// ─── Logging ─────────────────────────────────────────────────────────────────

/// Initialize tracing: a daily log file (plain text or JSON lines) plus
/// warnings on stderr.
///
/// On each startup:
/// 1. Prunes daily log files beyond `keep_files`.
/// 2. Opens today's `localai_YYYYMMDD.log` in append mode with a
///    line-flushing writer.
/// 3. Logs a startup banner with the log file path for discoverability.
///
/// Returns the log file path.
pub fn init_tracing(config: &LoggingConfig) -> std::io::Result<PathBuf> {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let log_dir = config
        .directory
        .clone()
        .unwrap_or_else(|| data_dir().join("logs"));
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(log_file_name(chrono::Local::now().date_naive()));
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    prune_old_logs(&log_dir, config.keep_files);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let writer = FlushingWriter::new(log_file);
    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(writer.clone())
            .with_current_span(false)
    });
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_writer(writer.clone())
            .with_ansi(false)
            .with_target(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(LevelFilter::WARN),
        )
        .try_init()
        .map_err(std::io::Error::other)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %data_dir().display(),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== localai-desktop starting ==="
    );

    Ok(log_path)
}

fn log_file_name(date: chrono::NaiveDate) -> String {
    format!("{LOG_FILE_PREFIX}{}{LOG_FILE_SUFFIX}", date.format("%Y%m%d"))
}

/// Delete the oldest daily log files so at most `keep` remain.
///
/// Names sort chronologically, so the lexically smallest go first. Other
/// files in the directory are left alone.
fn prune_old_logs(dir: &Path, keep: usize) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(LOG_FILE_SUFFIX))
        })
        .collect();

    if logs.len() <= keep {
        return;
    }
    logs.sort();
    let excess = logs.len() - keep;
    for old in logs.into_iter().take(excess) {
        let _ = std::fs::remove_file(old);
    }
}

/// A writer that wraps `std::fs::File` and flushes after every write.
///
/// Each log line is on disk immediately, so a crash loses nothing.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<std::sync::Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        let n = std::io::Write::write(&mut *f, buf)?;
        std::io::Write::flush(&mut *f)?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        std::io::Write::flush(&mut *f)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// Everything a front end needs, wired from one [`AppConfig`].
pub struct App {
    pub config: AppConfig,
    pub client: Arc<OllamaClient>,
    pub orchestrator: Orchestrator,
    pub sessions: SessionStore,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self, InferenceError> {
        let client = Arc::new(OllamaClient::new(config.backend.clone())?);
        let host: Arc<dyn HostControl> = Arc::new(SystemHost::new(config.system.clone()));
        let registry = Arc::new(tools::default_registry(host));

        tracing::info!(
            base_url = %config.backend.base_url,
            model = %config.backend.default_model,
            agent_enabled = config.agent.enabled,
            tools = registry.len(),
            "assistant configured"
        );

        let orchestrator = Orchestrator::new(
            client.clone(),
            registry,
            config.agent.clone(),
            config.backend.default_model.clone(),
        );

        let sessions = match config.agent.system_prompt.as_deref() {
            Some(prompt) if !prompt.trim().is_empty() => SessionStore::with_system_prompt(prompt),
            _ => SessionStore::new(),
        };

        Ok(Self {
            config,
            client,
            orchestrator,
            sessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(log_file_name(date), "localai_20260307.log");
    }

    #[test]
    fn test_prune_keeps_newest_logs() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=5 {
            std::fs::write(dir.path().join(format!("localai_202601{day:02}.log")), "x").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        prune_old_logs(dir.path(), 2);

        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["localai_20260104.log", "localai_20260105.log", "notes.txt"]);
    }

    #[test]
    fn test_app_builds_from_default_config() {
        let app = App::new(AppConfig::default()).unwrap();
        assert_eq!(app.orchestrator.default_model(), "qwen3:8b");
        assert!(app.config.agent.enabled);
    }

    #[tokio::test]
    async fn test_app_sessions_open_with_configured_system_prompt() {
        let mut config = AppConfig::default();
        config.agent.system_prompt = Some("Answer briefly.".to_string());
        let app = App::new(config).unwrap();

        let conversation = app.sessions.lock("alice").await;
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, inference::Role::System);
        assert_eq!(conversation.messages()[0].content, "Answer briefly.");
    }

    #[tokio::test]
    async fn test_app_sessions_start_empty_without_system_prompt() {
        let app = App::new(AppConfig::default()).unwrap();
        assert!(app.sessions.lock("alice").await.is_empty());
    }
}
