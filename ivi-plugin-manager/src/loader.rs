//! Loading plugin modules from shared libraries.
//!
//! A module exports two Rust-ABI functions, normally generated by
//! [`declare_plugin!`](crate::declare_plugin):
//!
//! * `ivi_plugin_api_version() -> u32`
//! * `ivi_create_plugin(&PluginContext) -> Result<PluginHandle, String>`
//!
//! Rust has no stable ABI, so a module must be built with the same compiler
//! and the same version of this workspace as the host. The version check
//! catches the second condition only.

use std::fmt;
use std::path::{Path, PathBuf};

use ivi_layermanager::{PluginContext, PluginHandle};
use libloading::Library;
use log::debug;

use crate::error::PluginManagerError;

/// Bumped whenever the plugin traits or the exported signatures change.
pub const PLUGIN_API_VERSION: u32 = 1;

pub const API_VERSION_SYMBOL: &str = "ivi_plugin_api_version";
pub const CREATE_PLUGIN_SYMBOL: &str = "ivi_create_plugin";

type ApiVersionFn = fn() -> u32;
type CreatePluginFn = fn(&PluginContext) -> Result<PluginHandle, String>;

/// An opened module. Dropping it unloads the code behind every handle it
/// created, so it must outlive them.
pub trait LoadedModule: Send + Sync {
    fn path(&self) -> &Path;
    fn api_version(&self) -> Result<u32, PluginManagerError>;
    fn create_plugin(&self, context: &PluginContext) -> Result<PluginHandle, PluginManagerError>;
}

/// Opens modules. Replaced by an in-memory loader in tests.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, plugin_id: &str, path: &Path) -> Result<Box<dyn LoadedModule>, PluginManagerError>;
}

/// Loads modules with `libloading`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryLoader;

impl ModuleLoader for LibraryLoader {
    fn load(&self, plugin_id: &str, path: &Path) -> Result<Box<dyn LoadedModule>, PluginManagerError> {
        debug!("Opening plugin library {}", path.display());
        // SAFETY: opening a library runs its initialisers. Only libraries from
        // the configured plugin directory are opened.
        let library = unsafe { Library::new(path) }.map_err(|e| PluginManagerError::LoadingError {
            plugin_id: plugin_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(SharedLibraryModule {
            plugin_id: plugin_id.to_string(),
            path: path.to_path_buf(),
            library,
        }))
    }
}

struct SharedLibraryModule {
    plugin_id: String,
    path: PathBuf,
    library: Library,
}

impl SharedLibraryModule {
    fn symbol<T: Copy>(&self, name: &str) -> Result<T, PluginManagerError> {
        let mut symbol_name = name.as_bytes().to_vec();
        symbol_name.push(0);
        // SAFETY: the symbol types above match what `declare_plugin!` exports;
        // the version check runs before the factory is called.
        let symbol = unsafe { self.library.get::<T>(&symbol_name) }.map_err(|_| PluginManagerError::SymbolNotFound {
            plugin_id: self.plugin_id.clone(),
            library_path: self.path.clone(),
            symbol_name: name.to_string(),
        })?;
        Ok(*symbol)
    }
}

impl LoadedModule for SharedLibraryModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn api_version(&self) -> Result<u32, PluginManagerError> {
        let version: ApiVersionFn = self.symbol(API_VERSION_SYMBOL)?;
        Ok(version())
    }

    fn create_plugin(&self, context: &PluginContext) -> Result<PluginHandle, PluginManagerError> {
        let create: CreatePluginFn = self.symbol(CREATE_PLUGIN_SYMBOL)?;
        create(context).map_err(|reason| PluginManagerError::InitializationError {
            plugin_id: self.plugin_id.clone(),
            reason,
        })
    }
}

impl fmt::Debug for SharedLibraryModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLibraryModule")
            .field("plugin_id", &self.plugin_id)
            .field("path", &self.path)
            .finish()
    }
}

/// Generates the exported entry points of a plugin module.
///
/// `$factory` is a function `fn(&PluginContext) -> Result<PluginHandle, PluginError>`.
///
/// ```rust,ignore
/// fn create(context: &PluginContext) -> Result<PluginHandle, PluginError> {
///     Ok(PluginHandle::Renderer(Arc::new(MyRenderer::new(context))))
/// }
/// ivi_plugin_manager::declare_plugin!(create);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($factory:path) => {
        #[no_mangle]
        pub fn ivi_plugin_api_version() -> u32 {
            $crate::PLUGIN_API_VERSION
        }

        #[no_mangle]
        pub fn ivi_create_plugin(
            context: &$crate::PluginContext,
        ) -> ::std::result::Result<$crate::PluginHandle, ::std::string::String> {
            let factory: fn(
                &$crate::PluginContext,
            ) -> ::std::result::Result<$crate::PluginHandle, $crate::PluginError> = $factory;
            factory(context).map_err(|e| e.to_string())
        }
    };
}
