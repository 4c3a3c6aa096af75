//! Plugins compiled into the binary.
//!
//! The binary builds a [`StaticRegistry`] at startup and registers each
//! built-in factory explicitly, in the order the plugins should be installed.

use std::fmt;

use ivi_layermanager::{PluginContext, PluginError, PluginHandle};

/// Builds a plugin instance from its context.
pub type PluginFactory = Box<dyn Fn(&PluginContext) -> Result<PluginHandle, PluginError> + Send + Sync>;

/// Named plugin factories in registration order.
#[derive(Default)]
pub struct StaticRegistry {
    entries: Vec<(String, PluginFactory)>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory. Names need not be unique; every entry is instantiated.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&PluginContext) -> Result<PluginHandle, PluginError> + Send + Sync + 'static,
    {
        self.entries.push((name.into(), Box::new(factory)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &PluginFactory)> {
        self.entries.iter().map(|(name, factory)| (name.as_str(), factory))
    }
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
