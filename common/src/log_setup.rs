use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging options for a host process.
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set, e.g. `"info"` or `"edgeview=debug"`.
    pub base_level: String,
    /// Directory for daily rolling log files. Console only when `None`.
    pub log_dir: Option<PathBuf>,
    pub file_prefix: String,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: "info".to_string(),
            log_dir: None,
            file_prefix: "edgeview".to_string(),
            ansi: true,
        }
    }
}

impl LogConfig {
    pub fn with_level(base_level: &str) -> Self {
        Self {
            base_level: base_level.to_string(),
            ..Default::default()
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Fails if the filter is malformed, the log directory cannot be created,
/// or a global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.base_level))
        .with_context(|| format!("Invalid log filter: {}", config.base_level))?;

    let console_writer = std::io::stdout.and(std::io::stderr.with_min_level(Level::WARN));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(config.ansi)
        .with_writer(console_writer);

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let file_appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix(&config.file_prefix)
                .filename_suffix("log")
                .max_log_files(5)
                .build(dir)
                .context("Failed to create log file appender")?;

            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            if LOG_GUARD.set(guard).is_err() {
                anyhow::bail!("Logging already initialized");
            }

            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(file_writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Logger initialization failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_console_only() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, "info");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn with_level_keeps_console_defaults() {
        let config = LogConfig::with_level("edgeview=debug");
        assert_eq!(config.base_level, "edgeview=debug");
        assert_eq!(config.file_prefix, "edgeview");
        assert!(config.ansi);
    }
}
