//! Configuration management.
//!
//! - [`types`]: the schema ([`CompositorConfig`] and its sections).
//! - [`defaults`]: default values used by `serde` for missing fields.
//! - [`loader`]: [`ConfigLoader`], which merges the system and user TOML files,
//!   applies `IVI_LM_*` environment overrides and validates the result.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ivi_core::config::ConfigLoader;
//!
//! match ConfigLoader::load(None) {
//!     Ok(config) => println!("display {}x{}", config.display.width, config.display.height),
//!     Err(e) => {
//!         ivi_core::logging::init_minimal_logging();
//!         tracing::error!("Configuration loading failed: {}", e);
//!     }
//! }
//! ```

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{
    CompositorConfig, DisplayConfig, HealthConfig, LayerSeed, LoggingConfig, PluginConfig, SceneConfig,
};

#[cfg(test)]
mod tests {
    use super::*;

    // Shared with plugins through an `Arc`.
    static_assertions::assert_impl_all!(CompositorConfig: Send, Sync, Clone);

    #[test]
    fn test_compositor_config_default() {
        let config = CompositorConfig::default();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.display, DisplayConfig::default());
        assert!(config.plugins.directory.is_none());
        assert!(config.scene.layers.is_empty());
        assert_eq!(config.health.watchdog_interval_ms, 1000);
    }

    #[test]
    fn test_compositor_config_deserialize_minimal() {
        let json_data = r#"{ "logging": { "level": "debug" } }"#;
        let config: CompositorConfig = serde_json::from_str(json_data).expect("Failed to deserialize");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file_path, None);
        assert_eq!(config.logging.format, "text");
    }
}
