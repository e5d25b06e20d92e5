//! Logging and tracing initialization.

use crate::config::LoggingConfig;
use crate::error::{GestureError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the file writer alive; dropping it flushes pending log lines
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Filter from `RUST_LOG`, falling back to `default_level`
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber
///
/// Logs always go to stderr so stdout stays free for recognized gestures.
/// When `config.file` is set, the same events are also appended to that file
/// through a non-blocking writer.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let (file_layer, file_guard) = match &config.file {
        Some(path) => {
            let file_name = path.file_name().ok_or_else(|| {
                GestureError::Config(format!("Log file path {:?} has no file name", path))
            })?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => std::path::PathBuf::from("."),
            };
            std::fs::create_dir_all(&dir)?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| GestureError::Config(format!("Logging already initialized: {}", e)))?;

    Ok(LoggingGuard { _file: file_guard })
}
