//! Logging bootstrap.
//!
//! Built on the `tracing` ecosystem. Supports console output and optional
//! daily-rolling file output, each in text or JSON format. Records emitted
//! through the `log` facade are picked up by `tracing-subscriber`'s bridge.

use crate::config::LoggingConfig;
use crate::error::{CoreError, LoggingError};

use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initializes a minimal logging setup, directing messages to `stderr`.
///
/// Intended for tests and for the window between process start and a
/// successfully loaded configuration. Filters with `RUST_LOG`, defaulting to
/// `info`. Errors (e.g. a global subscriber already being set) are ignored.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

/// Creates a file logging layer with a daily rolling appender.
///
/// The parent directory of `log_path` is created if missing.
fn create_file_layer(log_path: &Path, format: &str) -> Result<(BoxedLayer, WorkerGuard), CoreError> {
    let parent = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|source| CoreError::Filesystem {
        message: "Failed to create log directory".to_string(),
        path: parent.to_path_buf(),
        source,
    })?;

    let file_name = log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("layermanager.log"));
    let file_appender = tracing_appender::rolling::daily(parent, file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let layer = match format {
        "json" => fmt::layer().json().with_writer(non_blocking_writer).with_ansi(false).boxed(),
        _ => fmt::layer().with_writer(non_blocking_writer).with_ansi(false).boxed(),
    };
    Ok((layer, guard))
}

/// Keeps the file writer alive for the lifetime of the process so buffered
/// records are flushed.
static LOG_WORKER_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

fn parse_level(level: &str) -> Result<Level, LoggingError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        invalid => Err(LoggingError::InitializationFailure(format!(
            "Invalid log level in config: {}",
            invalid
        ))),
    }
}

/// Initializes the global logging system from a [`LoggingConfig`].
///
/// When `is_reload` is `true`, failing to replace an already installed
/// subscriber is reported on stderr and otherwise ignored.
///
/// # Errors
///
/// Returns [`CoreError::Logging`] for an invalid level or when a subscriber is
/// already installed on the initial setup, and [`CoreError::Filesystem`] when
/// the log directory cannot be created.
pub fn init_logging(config: &LoggingConfig, is_reload: bool) -> Result<(), CoreError> {
    let level = parse_level(&config.level)?;
    let format = config.format.to_lowercase();

    let stdout_layer = match format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_ansi(false)
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed(),
        _ => fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed(),
    };

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer];
    let mut new_file_guard = None;
    if let Some(log_path) = &config.file_path {
        let (file_layer, guard) = create_file_layer(log_path, &format)?;
        layers.push(file_layer.with_filter(EnvFilter::new(level.to_string())).boxed());
        new_file_guard = Some(guard);
    }

    let result = Registry::default().with(layers).try_init();

    match LOG_WORKER_GUARD.lock() {
        // The previous guard is dropped here, flushing its records.
        Ok(mut slot) => *slot = new_file_guard,
        Err(e) => eprintln!("[ERROR] Failed to lock LOG_WORKER_GUARD: {}. Log flushing may be affected.", e),
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) if is_reload => {
            eprintln!("[INFO] Re-initializing logging attempted. Previous logger may persist. Error: {}", e);
            Ok(())
        }
        Err(e) => Err(LoggingError::InitializationFailure(format!(
            "Failed to set global tracing subscriber. Was it already initialized? Error: {}",
            e
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_minimal_logging_runs_without_panic() {
        init_minimal_logging();
        // Second call hits the "already set" path, which is ignored.
        init_minimal_logging();
        tracing::info!("Minimal logging test: Info message after init_minimal_logging.");
    }

    #[test]
    fn test_create_file_layer_text_format() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test_text.log");

        let result = create_file_layer(&log_path, "text");
        assert!(result.is_ok(), "create_file_layer failed for text format: {:?}", result.err().map(|e| e.to_string()));
    }

    #[test]
    fn test_create_file_layer_ensures_parent_dir_exists() {
        let temp_dir = TempDir::new().unwrap();
        let nested_log_path = temp_dir.path().join("new_parent_dir/nested_log.log");
        assert!(!nested_log_path.parent().unwrap().exists());

        let result = create_file_layer(&nested_log_path, "json");
        assert!(result.is_ok());
        assert!(nested_log_path.parent().unwrap().exists(), "Parent directory was not created");
    }

    #[test]
    fn test_init_logging_invalid_level_returns_error() {
        let config = LoggingConfig {
            level: "supertrace".to_string(),
            file_path: None,
            format: "text".to_string(),
        };
        match init_logging(&config, false) {
            Err(CoreError::Logging(LoggingError::InitializationFailure(msg))) => {
                assert!(msg.contains("Invalid log level in config: supertrace"));
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_init_logging_reload_never_errors_when_subscriber_exists() {
        init_minimal_logging();
        let config = LoggingConfig { level: "debug".to_string(), file_path: None, format: "text".to_string() };
        let result = init_logging(&config, true);
        assert!(result.is_ok(), "Reloading logging should not error, but got: {:?}", result.err());
    }
}
