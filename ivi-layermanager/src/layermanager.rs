//! The command executor and plugin orchestrator.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use ivi_core::DisplayConfig;
use ivi_scene::{
    ClientHandle, LayerCapabilities, LayerId, LayerType, Notification, Pid, Scene, SceneError, ScreenId, ShaderId,
    SurfaceId,
};
use tracing::{debug, error, info, warn};

use crate::application::{ApplicationReference, UNKNOWN_PROCESS};
use crate::command::{Command, ExecutionContext, ExecutionResult, ExecutionType};
use crate::error::LayermanagerError;
use crate::executor::CommandExecutor;
use crate::plugin::{HealthState, PluginHandle, PluginSet};

/// Owns the scene, the per-client command queues and the installed plugins.
///
/// Built first, shared behind an `Arc`, then handed its plugins through
/// [`install_plugins`](Self::install_plugins) so that plugin factories can
/// receive a weak reference to it.
pub struct Layermanager {
    display: DisplayConfig,
    scene: Scene,
    pending: Mutex<HashMap<Pid, Vec<Command>>>,
    applications: Mutex<HashMap<ClientHandle, ApplicationReference>>,
    plugins: RwLock<PluginSet>,
}

impl Layermanager {
    pub fn new(display: DisplayConfig) -> Self {
        Self {
            display,
            scene: Scene::new(),
            pending: Mutex::new(HashMap::new()),
            applications: Mutex::new(HashMap::new()),
            plugins: RwLock::new(PluginSet::default()),
        }
    }

    /// Appends plugins in the given order.
    pub fn install_plugins(&self, handles: impl IntoIterator<Item = PluginHandle>) {
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        for handle in handles {
            info!(plugin = handle.name(), capability = handle.capability(), "Installed plugin");
            plugins.push(handle);
        }
    }

    /// Snapshot of the installed plugins; cheap, the handles are `Arc`s.
    pub fn plugins(&self) -> PluginSet {
        self.plugins.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Starts renderers, delegates the initial scene, then starts
    /// communicators and health monitors.
    ///
    /// Every renderer must start; the first failure stops the renderers
    /// started so far and aborts. Later stages only log their failures.
    pub fn start_management(&self) -> Result<(), LayermanagerError> {
        let plugins = self.plugins();
        let renderers = plugins.renderers();
        if renderers.is_empty() {
            error!("Cannot start management without a renderer");
            return Err(LayermanagerError::NoRenderer);
        }

        for (index, renderer) in renderers.iter().enumerate() {
            if let Err(source) = renderer.start(self.display.width, self.display.height, &self.display.name) {
                error!(renderer = renderer.name(), error = %source, "Renderer failed to start");
                for started in renderers[..index].iter().rev() {
                    if let Err(e) = started.stop() {
                        warn!(renderer = started.name(), error = %e, "Renderer failed to stop after aborted startup");
                    }
                }
                return Err(LayermanagerError::RendererStart { name: renderer.name().to_string(), source });
            }
            info!(
                renderer = renderer.name(),
                width = self.display.width,
                height = self.display.height,
                display = %self.display.name,
                "Renderer started"
            );
        }
        self.register_screens();

        for provider in plugins.scene_providers() {
            match provider.delegate_scene(self) {
                Ok(()) => info!(provider = provider.name(), "Initial scene delegated"),
                Err(e) => warn!(provider = provider.name(), error = %e, "Scene provider failed; initial scene may be incomplete"),
            }
        }

        for communicator in plugins.communicators() {
            match communicator.start() {
                Ok(()) => info!(communicator = communicator.name(), "Communicator started"),
                Err(e) => warn!(communicator = communicator.name(), error = %e, "Communicator failed to start"),
            }
        }

        for monitor in plugins.health_monitors() {
            match monitor.start() {
                Ok(()) => info!(monitor = monitor.name(), "Health monitor started"),
                Err(e) => warn!(monitor = monitor.name(), error = %e, "Health monitor failed to start"),
            }
        }
        Ok(())
    }

    /// Stops health monitors, renderers and communicators, in that order.
    /// Every plugin gets its stop call even if an earlier one failed.
    pub fn stop_management(&self) {
        let plugins = self.plugins();
        for monitor in plugins.health_monitors() {
            if let Err(e) = monitor.stop() {
                warn!(monitor = monitor.name(), error = %e, "Health monitor failed to stop");
            }
        }
        for renderer in plugins.renderers() {
            if let Err(e) = renderer.stop() {
                warn!(renderer = renderer.name(), error = %e, "Renderer failed to stop");
            }
        }
        for communicator in plugins.communicators() {
            if let Err(e) = communicator.stop() {
                warn!(communicator = communicator.name(), error = %e, "Communicator failed to stop");
            }
        }
        info!("Management stopped");
    }

    /// Drains pending notifications. The scene lock is held for the drain only.
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.scene.lock().drain_notifications()
    }

    /// Drains pending notifications and hands each one to every communicator.
    /// Returns how many notifications were drained.
    pub fn dispatch_notifications(&self) -> usize {
        let notifications = self.drain_notifications();
        if notifications.is_empty() {
            return 0;
        }
        let communicators = self.plugins().communicators();
        for notification in &notifications {
            for communicator in &communicators {
                if let Err(e) = communicator.send_notification(notification) {
                    warn!(
                        communicator = communicator.name(),
                        object = %notification.object,
                        error = %e,
                        "Failed to deliver notification"
                    );
                }
            }
        }
        notifications.len()
    }

    /// Number of commands `sender` has queued and not yet committed.
    pub fn pending_command_count(&self, sender: Pid) -> usize {
        self.pending_queues().get(&sender).map_or(0, Vec::len)
    }

    pub fn application(&self, client: ClientHandle) -> Option<ApplicationReference> {
        self.applications().get(&client).cloned()
    }

    /// Process name of the first client connected with `pid`.
    pub fn process_name(&self, pid: Pid) -> String {
        self.applications()
            .values()
            .find(|reference| reference.pid() == pid)
            .map_or_else(|| UNKNOWN_PROCESS.to_string(), |reference| reference.process_name().to_string())
    }

    fn register_screens(&self) {
        let Some(renderer) = self.plugins().primary_renderer() else {
            return;
        };
        let screens: Vec<_> = renderer
            .screen_ids()
            .into_iter()
            .map(|id| {
                let (width, height) =
                    renderer.screen_resolution(id).unwrap_or((self.display.width, self.display.height));
                (id, width, height)
            })
            .collect();

        let mut scene = self.scene.lock();
        for (id, width, height) in screens {
            debug!(screen = %id, width, height, "Registering screen");
            scene.add_screen(id, width, height);
        }
    }

    fn signal_redraw(&self) {
        if let Some(renderer) = self.plugins().primary_renderer() {
            renderer.signal_redraw();
        }
    }

    fn pending_queues(&self) -> MutexGuard<'_, HashMap<Pid, Vec<Command>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn applications(&self) -> MutexGuard<'_, HashMap<ClientHandle, ApplicationReference>> {
        self.applications.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommandExecutor for Layermanager {
    fn execute(&self, command: Command) -> ExecutionResult {
        let sender = command.sender();
        if command.execution_type() == ExecutionType::Asynchronous {
            debug!(sender, command = %command, "Queued command");
            self.pending_queues().entry(sender).or_default().push(command);
            return ExecutionResult::Success;
        }

        let (batch_len, result, rejections) = {
            let mut scene = self.scene.lock();
            // Lock order is scene, then pending. Taking the batch under the
            // scene lock keeps commits of one sender in queue order.
            let batch = if command.is_commit() {
                self.pending_queues().remove(&sender).unwrap_or_default()
            } else {
                Vec::new()
            };
            let batch_len = batch.len();
            let mut context = ExecutionContext::new(&mut scene, batch);
            let result = command.execute(&mut context);
            (batch_len, result, context.into_rejections())
        };

        let process = self.process_name(sender);
        for (description, reason) in &rejections {
            warn!(sender, process = %process, command = %description, %reason, "Command rejected");
        }
        if result.needs_redraw() {
            self.signal_redraw();
        }
        if command.is_commit() {
            debug!(sender, process = %process, commands = batch_len, ?result, "Committed");
        } else {
            debug!(sender, process = %process, command = %command, ?result, "Executed command");
        }
        result
    }

    fn allocate_layer_id(&self) -> Result<LayerId, SceneError> {
        self.scene.lock().allocate_layer_id()
    }

    fn allocate_surface_id(&self) -> Result<SurfaceId, SceneError> {
        self.scene.lock().allocate_surface_id()
    }

    fn allocate_shader_id(&self) -> Result<ShaderId, SceneError> {
        self.scene.lock().shaders_mut().allocate_id()
    }

    fn add_application_reference(&self, reference: ApplicationReference) {
        info!(
            client = %reference.handle(),
            pid = reference.pid(),
            process = reference.process_name(),
            "Client connected"
        );
        self.applications().insert(reference.handle(), reference);
    }

    fn remove_application_reference(&self, client: ClientHandle) {
        let Some(reference) = self.applications().remove(&client) else {
            debug!(%client, "Disconnect of unknown client ignored");
            return;
        };
        self.scene.lock().remove_client(client);

        if reference.is_authenticated() {
            let discarded = self.pending_queues().remove(&reference.pid()).map_or(0, |queue| queue.len());
            info!(
                %client,
                pid = reference.pid(),
                process = reference.process_name(),
                discarded,
                "Client disconnected"
            );
        } else {
            info!(%client, "Unauthenticated client disconnected");
        }
    }

    fn health(&self) -> HealthState {
        let plugins = self.plugins();
        for handle in plugins.handles() {
            let state = handle.health();
            if state != HealthState::Running {
                debug!(plugin = handle.name(), %state, "Plugin is not healthy");
                return state;
            }
        }
        HealthState::Running
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn layer_type_capabilities(&self, layer_type: LayerType) -> LayerCapabilities {
        self.plugins()
            .primary_renderer()
            .map_or(LayerCapabilities::empty(), |renderer| renderer.layer_type_capabilities(layer_type))
    }

    fn hardware_layer_count(&self, screen: ScreenId) -> u32 {
        self.plugins().primary_renderer().map_or(0, |renderer| renderer.hardware_layer_count(screen))
    }

    fn screen_resolution(&self, screen: ScreenId) -> Option<(u32, u32)> {
        self.plugins().primary_renderer().and_then(|renderer| renderer.screen_resolution(screen))
    }

    fn screen_ids(&self) -> Vec<ScreenId> {
        self.plugins().primary_renderer().map_or_else(Vec::new, |renderer| renderer.screen_ids())
    }
}
