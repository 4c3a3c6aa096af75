//! Error types for the IVI plugin manager.

use std::path::PathBuf;
use thiserror::Error;

/// Why a plugin could not be discovered, loaded or instantiated.
///
/// None of these abort loading: the manager logs the error, records it and
/// moves on to the next plugin.
#[derive(Debug, Error)]
pub enum PluginManagerError {
    #[error("Plugin discovery failed: {0}")]
    DiscoveryError(String),

    #[error("Manifest parsing error in '{path}': {source}")]
    ManifestParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error related to manifest file '{path}': {source}")]
    ManifestIoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin loading failed for '{plugin_id}': {reason}")]
    LoadingError { plugin_id: String, reason: String },

    #[error("Plugin initialization failed for '{plugin_id}': {reason}")]
    InitializationError { plugin_id: String, reason: String },

    #[error("Incompatible plugin ABI version for '{plugin_id}'. Expected {expected}, found {found}")]
    IncompatibleAbiVersion { plugin_id: String, expected: u32, found: u32 },

    #[error("Plugin entry point symbol '{symbol_name}' not found in library '{library_path}' for plugin '{plugin_id}'")]
    SymbolNotFound {
        plugin_id: String,
        library_path: PathBuf,
        symbol_name: String,
    },
}

impl PluginManagerError {
    /// The plugin the error is about, when known.
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            PluginManagerError::LoadingError { plugin_id, .. }
            | PluginManagerError::InitializationError { plugin_id, .. }
            | PluginManagerError::IncompatibleAbiVersion { plugin_id, .. }
            | PluginManagerError::SymbolNotFound { plugin_id, .. } => Some(plugin_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_mismatch_message() {
        let err = PluginManagerError::IncompatibleAbiVersion { plugin_id: "gles".to_string(), expected: 1, found: 3 };
        assert_eq!(err.to_string(), "Incompatible plugin ABI version for 'gles'. Expected 1, found 3");
        assert_eq!(err.plugin_id(), Some("gles"));
        assert_eq!(PluginManagerError::DiscoveryError("x".into()).plugin_id(), None);
    }
}
