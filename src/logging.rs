//! File logging. The terminal belongs to the interface, so every event goes
//! to `<cache_dir>/openduck/openduck.log` through a non-blocking writer.

use std::path::PathBuf;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::cache::LOG_FILE;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl LoggingConfig {
    pub fn new(log_dir: impl Into<PathBuf>, level: &str, debug: bool) -> Self {
        let level = if debug { "debug" } else { level };
        Self {
            log_dir: log_dir.into(),
            default_filter: format!("warn,openduck={level}"),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE)
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered lines are flushed.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre!("Could not initialize logging: {}", e))?;

    tracing::info!(log_file = %config.log_file().display(), "logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_raises_level() {
        let config = LoggingConfig::new("/tmp/x", "info", true);
        assert_eq!(config.default_filter, "warn,openduck=debug");
        let config = LoggingConfig::new("/tmp/x", "warn", false);
        assert_eq!(config.default_filter, "warn,openduck=warn");
        assert_eq!(config.log_file(), PathBuf::from("/tmp/x/openduck.log"));
    }
}
