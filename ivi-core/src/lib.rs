//! # IVI Layer Manager Core Library (`ivi-core`)
//!
//! Foundation shared by every crate of the layer manager workspace:
//!
//! - **Error Handling**: [`CoreError`] and its specific errors [`ConfigError`]
//!   and [`LoggingError`].
//! - **Configuration**: [`CompositorConfig`] loaded by [`ConfigLoader`] from TOML
//!   files and `IVI_LM_*` environment variables.
//! - **Logging**: a `tracing` based setup with console and optional rolling file
//!   output, in text or JSON format.
//!
//! ```rust,ignore
//! use ivi_core::{ConfigLoader, init_logging, CoreError};
//!
//! fn main() -> Result<(), CoreError> {
//!     let config = ConfigLoader::load(None)?;
//!     init_logging(&config.logging, false)?;
//!     tracing::info!("layer manager core initialized");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CompositorConfig, ConfigLoader, DisplayConfig, LoggingConfig, PluginConfig};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
