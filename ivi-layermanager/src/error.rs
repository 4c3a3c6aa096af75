//! Error types for the layer manager.

use thiserror::Error;

/// Failure reported by a plugin from one of its lifecycle or backend calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PluginError {
    message: String,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that abort a management operation.
///
/// Only renderer trouble is fatal to `start_management`; every other plugin
/// failure is logged and the layer manager runs degraded.
#[derive(Debug, Error)]
pub enum LayermanagerError {
    #[error("No renderer plugin is installed")]
    NoRenderer,

    #[error("Renderer '{name}' failed to start: {source}")]
    RendererStart {
        name: String,
        #[source]
        source: PluginError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_renderer_start_chains_plugin_error() {
        let err = LayermanagerError::RendererStart {
            name: "gles".to_string(),
            source: PluginError::new("no EGL display"),
        };
        assert_eq!(err.to_string(), "Renderer 'gles' failed to start: no EGL display");
        assert_eq!(err.source().map(|s| s.to_string()), Some("no EGL display".to_string()));
    }
}
