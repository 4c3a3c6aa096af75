//! Configuration data structures for the layer manager.
//!
//! These structs are populated by deserializing a TOML file and then patched
//! by environment variables and command line flags. Every field has a default
//! supplied by a function in [`super::defaults`], and unknown fields are
//! rejected via `#[serde(deny_unknown_fields)]`.

use serde::Deserialize;
use std::path::PathBuf;
use super::defaults;

/// Configuration settings for the logging subsystem.
///
/// # Examples
///
/// ```
/// use ivi_core::config::LoggingConfig;
///
/// let log_config: LoggingConfig = toml::from_str(r#"
/// level = "debug"
/// format = "json"
/// "#).unwrap();
/// assert_eq!(log_config.level, "debug");
/// assert_eq!(log_config.file_path, None);
/// assert_eq!(log_config.format, "json");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// The minimum log level to record.
    /// Valid values (case-insensitive): "trace", "debug", "info", "warn", "error".
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional path to a file where logs should be written.
    /// If `None`, file logging is disabled.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// The format for log messages: "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// The physical display the renderers are started on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Display width in pixels. Must be non-zero.
    #[serde(default = "defaults::default_display_width")]
    pub width: u32,
    /// Display height in pixels. Must be non-zero.
    #[serde(default = "defaults::default_display_height")]
    pub height: u32,
    /// Window-system display name handed to every renderer.
    #[serde(default = "defaults::default_display_name")]
    pub name: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        defaults::default_display_config()
    }
}

/// Where and which plugins are loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Directory scanned for loadable plugin modules. `None` disables dynamic loading.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Plugin names that are discovered but never instantiated.
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// Settings for the watchdog health monitor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Interval between two `health()` polls, in milliseconds.
    #[serde(default = "defaults::default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { watchdog_interval_ms: defaults::default_watchdog_interval_ms() }
    }
}

/// One layer of the initial scene created at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSeed {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default = "defaults::default_true")]
    pub visible: bool,
    #[serde(default = "defaults::default_opacity")]
    pub opacity: f64,
    /// Screen whose render order receives this layer.
    #[serde(default)]
    pub screen: u32,
}

/// Initial scene delegated by the built-in scene provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    #[serde(default)]
    pub layers: Vec<LayerSeed>,
}

/// Root configuration structure for the layer manager process.
///
/// # Examples
///
/// ```
/// use ivi_core::config::CompositorConfig;
///
/// let config: CompositorConfig = toml::from_str(r#"
/// [display]
/// width = 800
///
/// [[scene.layers]]
/// id = 1000
/// width = 800
/// height = 480
/// "#).unwrap();
/// assert_eq!(config.display.width, 800);
/// assert_eq!(config.display.height, 480);
/// assert_eq!(config.scene.layers[0].opacity, 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositorConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub plugins: PluginConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}
