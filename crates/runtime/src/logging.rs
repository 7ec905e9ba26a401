//! Tracing subscriber setup.
//!
//! Logs always go to stderr. When a directory is configured they are also
//! written to a daily-rolling file through a non-blocking writer; keep the
//! returned guard alive for as long as file logging should continue.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::{Result, RuntimeError};

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string, e.g. `info,spell_core=debug`.
    pub filter: String,
    /// Directory for rolling log files; stderr only when unset.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
            file_prefix: "spell-runtime.log".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Reads `SPELL_LOG` (falling back to `RUST_LOG`) and `SPELL_LOG_DIR`,
    /// after loading a `.env` file if one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Ok(filter) = std::env::var("SPELL_LOG").or_else(|_| std::env::var("RUST_LOG")) {
            config.filter = filter;
        }
        if let Ok(dir) = std::env::var("SPELL_LOG_DIR")
            && !dir.is_empty()
        {
            config.directory = Some(PathBuf::from(dir));
        }
        config
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails on a malformed filter, an unwritable log directory, or when another
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.filter).map_err(RuntimeError::LogFilter)?;

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(RuntimeError::LoggingInit)?;

    tracing::info!(filter = %config.filter, directory = ?config.directory, "Logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_filter_is_rejected_before_install() {
        let config = LoggingConfig {
            filter: "spell_core=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(RuntimeError::LogFilter(_))
        ));
    }
}
