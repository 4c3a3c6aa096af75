//! Default configuration values.
//!
//! These functions are used by `serde`'s `default` attribute in the configuration
//! structures to provide values when they are not specified in the file.

use crate::config::{DisplayConfig, LoggingConfig};
use std::path::PathBuf;

pub(crate) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

/// Returns the default log level string (`"info"`).
pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

/// Returns the default log file path (`None`).
pub(crate) fn default_log_file_path() -> Option<PathBuf> {
    None // No log file by default
}

/// Returns the default log format string (`"text"`).
pub(crate) fn default_log_format() -> String {
    "text".to_string()
}

pub(crate) fn default_display_config() -> DisplayConfig {
    DisplayConfig {
        width: default_display_width(),
        height: default_display_height(),
        name: default_display_name(),
    }
}

pub(crate) fn default_display_width() -> u32 {
    1280
}

pub(crate) fn default_display_height() -> u32 {
    480
}

pub(crate) fn default_display_name() -> String {
    ":0".to_string()
}

pub(crate) fn default_watchdog_interval_ms() -> u64 {
    1000
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_opacity() -> f64 {
    1.0
}
