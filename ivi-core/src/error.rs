//! Error handling for the IVI layer manager core layer.
//!
//! The main error type for this crate is [`CoreError`], which encapsulates
//! more specific errors like [`ConfigError`] and [`LoggingError`]. Higher
//! layers (scene, executor, plugin manager) define their own error enums and
//! only surface `CoreError` during process bootstrap.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ivi_core::error::{CoreError, ConfigError};
//!
//! fn check_width(width: u32) -> Result<(), CoreError> {
//!     if width == 0 {
//!         return Err(ConfigError::ValidationError("display width must be > 0".into()).into());
//!     }
//!     Ok(())
//! }
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for the layer manager bootstrap.
///
/// This enum represents all errors that can occur while reading configuration
/// and setting up logging. None of them can happen once the scene is running.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    /// Wraps a [`ConfigError`].
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while installing the global logging subscriber.
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// Errors related to filesystem operations, such as creating the log directory.
    /// Includes a message, the path involved, and the source I/O error.
    #[error("Filesystem Error: {message} (Path: {path:?})")]
    Filesystem {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Error type for configuration-related operations.
///
/// It is typically wrapped by [`CoreError::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An error occurred while attempting to read a configuration file.
    /// Includes the path to the file and the source I/O error.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An error occurred while parsing a configuration file (e.g., invalid TOML).
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// An environment override could not be interpreted.
    #[error("Invalid value '{value}' for environment variable {variable}")]
    InvalidEnvironment { variable: String, value: String },

    /// An error occurred due to invalid configuration values after successful parsing.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Error type for logging-related operations.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// Failed to initialize the logging system.
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    /// An I/O error occurred during logging setup, such as failing to open a log file.
    #[error("Logging I/O error: {0}")]
    IoError(#[from] io::Error),
}
