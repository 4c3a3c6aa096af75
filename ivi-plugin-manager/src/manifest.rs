//! Defines the structure for the `Plugin.toml` manifest file and provides
//! functionality to load and parse it.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use super::error::PluginManagerError;

/// Represents the overall structure of the `Plugin.toml` file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    pub plugin: PluginDetails,
}

/// Contains the core metadata for a plugin, corresponding to the `[plugin]` table.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PluginDetails {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    /// Library file relative to the manifest's directory. Without an
    /// extension the platform's naming convention is applied (`libNAME.so`).
    pub entry_point: String,
    /// Plugin ABI version the library was built against. Checked before the
    /// library is opened.
    #[serde(default)]
    pub api_version: Option<u32>,
}

impl PluginManifest {
    /// Loads and parses a `Plugin.toml` file from the given path.
    pub fn load_from_file(path: &Path) -> Result<Self, PluginManagerError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PluginManagerError::ManifestIoError {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        Self::load_from_string(&content, path)
    }

    /// Parses a `Plugin.toml` string.
    pub fn load_from_string(content: &str, source_path_for_error: &Path) -> Result<Self, PluginManagerError> {
        toml::from_str(content).map_err(|e| {
            PluginManagerError::ManifestParseError {
                path: source_path_for_error.to_path_buf(),
                source: e,
            }
        })
    }
}
