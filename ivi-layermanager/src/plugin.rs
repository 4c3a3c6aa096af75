//! Capability traits implemented by plugins.
//!
//! A plugin provides one capability: it renders the scene, talks to clients,
//! delegates an initial scene or watches the layer manager's health. The
//! [`PluginHandle`] enum classifies an instance by that capability so the
//! [`Layermanager`](crate::Layermanager) can drive each group in the order
//! startup and shutdown require.
//!
//! All methods take `&self`: communicators call into the executor from their
//! own threads, so every plugin is shared behind an `Arc` and does its own
//! interior locking.

use std::fmt;
use std::sync::{Arc, Weak};

use ivi_core::CompositorConfig;
use ivi_scene::{LayerCapabilities, LayerType, Notification, ScreenId};

use crate::error::PluginError;
use crate::executor::CommandExecutor;

/// Liveness of a plugin, or of the layer manager as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HealthState {
    #[default]
    Running,
    /// Still working with reduced functionality.
    Degraded,
    Error,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthState::Running => "running",
            HealthState::Degraded => "degraded",
            HealthState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Common to every plugin.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn health(&self) -> HealthState {
        HealthState::Running
    }
}

/// Draws the scene on a window system.
pub trait Renderer: Plugin {
    fn start(&self, width: u32, height: u32, display_name: &str) -> Result<(), PluginError>;
    fn stop(&self) -> Result<(), PluginError>;
    /// Asks for a repaint. Called outside the scene lock.
    fn signal_redraw(&self);
    fn layer_type_capabilities(&self, layer_type: LayerType) -> LayerCapabilities;
    fn hardware_layer_count(&self, screen: ScreenId) -> u32;
    fn screen_resolution(&self, screen: ScreenId) -> Option<(u32, u32)>;
    fn screen_ids(&self) -> Vec<ScreenId>;
}

/// Decodes client requests into commands and delivers notifications back.
pub trait Communicator: Plugin {
    fn start(&self) -> Result<(), PluginError>;
    fn stop(&self) -> Result<(), PluginError>;
    /// Forwards a drained notification to its subscribers.
    fn send_notification(&self, notification: &Notification) -> Result<(), PluginError>;
}

/// Issues the commands that build the initial scene.
pub trait SceneProvider: Plugin {
    fn delegate_scene(&self, executor: &dyn CommandExecutor) -> Result<(), PluginError>;
}

/// Polls [`CommandExecutor::health`] and reports to the platform watchdog.
pub trait HealthMonitor: Plugin {
    fn start(&self) -> Result<(), PluginError>;
    fn stop(&self) -> Result<(), PluginError>;
}

/// A plugin instance classified by capability.
#[derive(Clone)]
pub enum PluginHandle {
    Renderer(Arc<dyn Renderer>),
    Communicator(Arc<dyn Communicator>),
    SceneProvider(Arc<dyn SceneProvider>),
    HealthMonitor(Arc<dyn HealthMonitor>),
}

impl PluginHandle {
    pub fn name(&self) -> &str {
        self.as_plugin().name()
    }

    pub fn health(&self) -> HealthState {
        self.as_plugin().health()
    }

    pub fn capability(&self) -> &'static str {
        match self {
            PluginHandle::Renderer(_) => "renderer",
            PluginHandle::Communicator(_) => "communicator",
            PluginHandle::SceneProvider(_) => "scene provider",
            PluginHandle::HealthMonitor(_) => "health monitor",
        }
    }

    fn as_plugin(&self) -> &dyn Plugin {
        match self {
            PluginHandle::Renderer(p) => p.as_ref(),
            PluginHandle::Communicator(p) => p.as_ref(),
            PluginHandle::SceneProvider(p) => p.as_ref(),
            PluginHandle::HealthMonitor(p) => p.as_ref(),
        }
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("capability", &self.capability())
            .field("name", &self.name())
            .finish()
    }
}

/// The installed plugins in registration order.
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    handles: Vec<PluginHandle>,
}

impl PluginSet {
    pub fn new(handles: Vec<PluginHandle>) -> Self {
        Self { handles }
    }

    pub fn push(&mut self, handle: PluginHandle) {
        self.handles.push(handle);
    }

    pub fn handles(&self) -> &[PluginHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn renderers(&self) -> Vec<Arc<dyn Renderer>> {
        self.handles
            .iter()
            .filter_map(|h| match h {
                PluginHandle::Renderer(p) => Some(Arc::clone(p)),
                _ => None,
            })
            .collect()
    }

    pub fn communicators(&self) -> Vec<Arc<dyn Communicator>> {
        self.handles
            .iter()
            .filter_map(|h| match h {
                PluginHandle::Communicator(p) => Some(Arc::clone(p)),
                _ => None,
            })
            .collect()
    }

    pub fn scene_providers(&self) -> Vec<Arc<dyn SceneProvider>> {
        self.handles
            .iter()
            .filter_map(|h| match h {
                PluginHandle::SceneProvider(p) => Some(Arc::clone(p)),
                _ => None,
            })
            .collect()
    }

    pub fn health_monitors(&self) -> Vec<Arc<dyn HealthMonitor>> {
        self.handles
            .iter()
            .filter_map(|h| match h {
                PluginHandle::HealthMonitor(p) => Some(Arc::clone(p)),
                _ => None,
            })
            .collect()
    }

    /// The renderer answering single-instance queries.
    pub fn primary_renderer(&self) -> Option<Arc<dyn Renderer>> {
        self.renderers().into_iter().next()
    }
}

/// What a plugin factory receives.
///
/// The executor is held weakly: the layer manager owns its plugins, so a
/// strong reference back would keep both alive forever.
#[derive(Clone)]
pub struct PluginContext {
    executor: Weak<dyn CommandExecutor>,
    config: Arc<CompositorConfig>,
}

impl PluginContext {
    pub fn new(executor: Weak<dyn CommandExecutor>, config: Arc<CompositorConfig>) -> Self {
        Self { executor, config }
    }

    /// The executor, unless it has already been dropped.
    pub fn executor(&self) -> Option<Arc<dyn CommandExecutor>> {
        self.executor.upgrade()
    }

    pub fn executor_weak(&self) -> Weak<dyn CommandExecutor> {
        Weak::clone(&self.executor)
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("executor_alive", &(self.executor.strong_count() > 0))
            .field("config", &self.config)
            .finish()
    }
}
