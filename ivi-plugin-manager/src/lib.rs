//! IVI Plugin Manager
//!
//! Discovers, loads and instantiates the plugins of the IVI layer manager.
//! Plugins come from two sources, merged into one list:
//!
//! 1. the [`StaticRegistry`] the binary fills with its built-in factories,
//!    in registration order;
//! 2. modules in the configured plugin directory, in path order. A module is
//!    either a shared library placed directly in the directory or a
//!    subdirectory whose `Plugin.toml` names the library.
//!
//! A plugin that fails to load or to instantiate is logged and skipped; the
//! rest still load.

pub mod error;
pub mod loader;
pub mod manifest;
pub mod registry;

use std::fs;
use std::path::{Path, PathBuf};

use ivi_core::PluginConfig;
use log::{error, info, warn};

pub use error::PluginManagerError;
pub use ivi_layermanager::{PluginContext, PluginError, PluginHandle};
pub use loader::{LibraryLoader, LoadedModule, ModuleLoader, PLUGIN_API_VERSION};
pub use manifest::PluginManifest;
pub use registry::{PluginFactory, StaticRegistry};

/// Represents a discovered plugin module.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredPlugin {
    /// Manifest id, or the library's file stem for a bare library.
    pub id: String,
    /// Manifest name, or the library's file stem for a bare library.
    pub name: String,
    pub manifest: Option<PluginManifest>,
    /// Path to the library to open. `None` when the manifest names no entry point.
    pub entry_point_path: Option<PathBuf>,
}

impl DiscoveredPlugin {
    fn is_disabled(&self, disabled: &[String]) -> bool {
        disabled.iter().any(|d| *d == self.name || *d == self.id)
    }
}

/// Scans a directory for plugin modules.
///
/// Entries are visited in path order so that the resulting plugin order does
/// not depend on the filesystem. Unreadable entries and invalid manifests are
/// logged and skipped.
pub fn discover_plugins_in_directory(directory: &Path) -> Result<Vec<DiscoveredPlugin>, PluginManagerError> {
    if !directory.is_dir() {
        return Err(PluginManagerError::DiscoveryError(format!(
            "Plugin directory not found or is not a directory: {}",
            directory.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(directory).map_err(|e| {
        PluginManagerError::DiscoveryError(format!("Failed to read plugin directory {}: {}", directory.display(), e))
    })? {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => warn!("Failed to access entry in plugin directory {}: {}", directory.display(), e),
        }
    }
    paths.sort();

    let mut discovered_plugins = Vec::new();
    for path in paths {
        if path.is_dir() {
            let manifest_path = path.join("Plugin.toml");
            if !manifest_path.is_file() {
                continue;
            }
            match PluginManifest::load_from_file(&manifest_path) {
                Ok(manifest) => {
                    info!(
                        "Discovered plugin '{}' (version {}) at {}",
                        manifest.plugin.name,
                        manifest.plugin.version,
                        manifest_path.display()
                    );
                    let entry_point_path = entry_point_path(&path, &manifest.plugin.entry_point);
                    if entry_point_path.is_none() {
                        warn!("Plugin '{}' has an empty entry_point defined in its manifest.", manifest.plugin.name);
                    }
                    discovered_plugins.push(DiscoveredPlugin {
                        id: manifest.plugin.id.clone(),
                        name: manifest.plugin.name.clone(),
                        manifest: Some(manifest),
                        entry_point_path,
                    });
                }
                Err(e) => error!("Failed to load or parse manifest at {}: {}", manifest_path.display(), e),
            }
        } else if is_shared_library(&path) {
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            info!("Discovered plugin library {}", path.display());
            discovered_plugins.push(DiscoveredPlugin {
                id: stem.clone(),
                name: stem,
                manifest: None,
                entry_point_path: Some(path),
            });
        }
    }

    Ok(discovered_plugins)
}

fn entry_point_path(plugin_dir: &Path, entry_point: &str) -> Option<PathBuf> {
    if entry_point.is_empty() {
        return None;
    }
    if Path::new(entry_point).extension().is_some() {
        Some(plugin_dir.join(entry_point))
    } else {
        Some(plugin_dir.join(libloading::library_filename(entry_point)))
    }
}

fn is_shared_library(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |ext| ext == std::env::consts::DLL_EXTENSION)
}

/// Result of [`PluginManager::load_plugins`].
#[derive(Debug, Default)]
pub struct LoadedPlugins {
    /// Instances in installation order: static registrations, then modules.
    pub handles: Vec<PluginHandle>,
    /// Everything that was skipped, in the order it happened.
    pub failures: Vec<PluginManagerError>,
}

/// Instantiates plugins and keeps their modules loaded.
///
/// Handles created from a module point into its code, so the manager must
/// be dropped only after every handle it produced.
pub struct PluginManager {
    registry: StaticRegistry,
    loader: Box<dyn ModuleLoader>,
    modules: Vec<Box<dyn LoadedModule>>,
}

impl PluginManager {
    pub fn new(registry: StaticRegistry) -> Self {
        Self::with_loader(registry, Box::new(LibraryLoader))
    }

    pub fn with_loader(registry: StaticRegistry, loader: Box<dyn ModuleLoader>) -> Self {
        Self { registry, loader, modules: Vec::new() }
    }

    /// Number of modules currently held open.
    pub fn loaded_module_count(&self) -> usize {
        self.modules.len()
    }

    /// Instantiates every static registration and every module in
    /// `config.directory`, except those named in `config.disabled`.
    pub fn load_plugins(&mut self, context: &PluginContext, config: &PluginConfig) -> LoadedPlugins {
        let mut loaded = LoadedPlugins::default();

        for (name, factory) in self.registry.entries() {
            if config.disabled.iter().any(|d| d == name) {
                info!("Built-in plugin '{}' is disabled", name);
                continue;
            }
            match factory(context) {
                Ok(handle) => {
                    info!("Instantiated built-in {} plugin '{}'", handle.capability(), name);
                    loaded.handles.push(handle);
                }
                Err(e) => {
                    error!("Built-in plugin '{}' failed to initialize: {}", name, e);
                    loaded.failures.push(PluginManagerError::InitializationError {
                        plugin_id: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let Some(directory) = config.directory.as_deref() else {
            return loaded;
        };
        let discovered = match discover_plugins_in_directory(directory) {
            Ok(discovered) => discovered,
            Err(e) => {
                warn!("Skipping dynamic plugins: {}", e);
                loaded.failures.push(e);
                return loaded;
            }
        };

        for plugin in discovered {
            if plugin.is_disabled(&config.disabled) {
                info!("Plugin '{}' is disabled", plugin.name);
                continue;
            }
            match self.load_module(&plugin, context) {
                Ok(handle) => {
                    info!("Loaded {} plugin '{}'", handle.capability(), plugin.name);
                    loaded.handles.push(handle);
                }
                Err(e) => {
                    error!("{}", e);
                    loaded.failures.push(e);
                }
            }
        }
        loaded
    }

    fn load_module(&mut self, plugin: &DiscoveredPlugin, context: &PluginContext) -> Result<PluginHandle, PluginManagerError> {
        let Some(path) = plugin.entry_point_path.as_deref() else {
            return Err(PluginManagerError::LoadingError {
                plugin_id: plugin.id.clone(),
                reason: "manifest names no entry point".to_string(),
            });
        };

        let declared = plugin.manifest.as_ref().and_then(|m| m.plugin.api_version);
        if let Some(found) = declared.filter(|v| *v != PLUGIN_API_VERSION) {
            return Err(incompatible(&plugin.id, found));
        }

        let module = self.loader.load(&plugin.id, path)?;
        let found = module.api_version()?;
        if found != PLUGIN_API_VERSION {
            return Err(incompatible(&plugin.id, found));
        }
        let handle = module.create_plugin(context)?;
        self.modules.push(module);
        Ok(handle)
    }
}

fn incompatible(plugin_id: &str, found: u32) -> PluginManagerError {
    PluginManagerError::IncompatibleAbiVersion { plugin_id: plugin_id.to_string(), expected: PLUGIN_API_VERSION, found }
}
