//! Plugins compiled into the daemon.

pub mod headless_renderer;
pub mod scene_loader;
pub mod watchdog;

use std::sync::Arc;

use ivi_layermanager::PluginHandle;
use ivi_plugin_manager::StaticRegistry;

pub use headless_renderer::HeadlessRenderer;
pub use scene_loader::ConfiguredSceneProvider;
pub use watchdog::WatchdogMonitor;

/// Registers the built-ins in install order. The headless renderer comes
/// first so it is the primary renderer unless `plugins.disabled` names it.
pub fn register_builtin_plugins(registry: &mut StaticRegistry) {
    registry
        .register(headless_renderer::NAME, |context| {
            Ok(PluginHandle::Renderer(Arc::new(HeadlessRenderer::new(context))))
        })
        .register(scene_loader::NAME, |context| {
            Ok(PluginHandle::SceneProvider(Arc::new(ConfiguredSceneProvider::new(context))))
        })
        .register(watchdog::NAME, |context| {
            Ok(PluginHandle::HealthMonitor(Arc::new(WatchdogMonitor::new(context))))
        });
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Weak};

    use ivi_core::CompositorConfig;
    use ivi_layermanager::{CommandExecutor, Layermanager, PluginContext};

    pub fn context_for(lm: &Arc<Layermanager>) -> PluginContext {
        let executor: Weak<dyn CommandExecutor> = Arc::downgrade(lm) as Weak<dyn CommandExecutor>;
        PluginContext::new(executor, Arc::new(CompositorConfig::default()))
    }
}
