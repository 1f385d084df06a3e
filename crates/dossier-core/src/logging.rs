//! Tracing setup.
//!
//! The CLI logs to stderr. The TUI owns the terminal, so it logs to
//! `$DOSSIER_HOME/logs/dossier.log` through a non-blocking writer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "DOSSIER_LOG";

/// File name used inside the logs directory.
pub const LOG_FILE_NAME: &str = "dossier.log";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// The default log file under `logs_dir`.
    pub fn file_in(logs_dir: &Path) -> Self {
        LogTarget::File(logs_dir.join(LOG_FILE_NAME))
    }
}

/// Keeps the background writer alive. Dropping it flushes pending lines.
#[derive(Debug)]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Builds the filter from `DOSSIER_LOG`, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(target: &LogTarget, default_level: &str) -> Result<LogGuard> {
    let filter = env_filter(default_level);

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
            Ok(LogGuard { _worker: None })
        }
        LogTarget::File(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .map_or_else(|| LOG_FILE_NAME.into(), ToOwned::to_owned);

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, worker) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
    }
}
