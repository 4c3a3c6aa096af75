//! Mock plugins shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ivi_layermanager::{
    Command, CommandExecutor, Communicator, HealthMonitor, HealthState, Plugin, PluginError, Renderer,
    SceneProvider,
};
use ivi_scene::{LayerCapabilities, LayerType, Notification, ScreenId};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("debug").try_init();
}

/// Lifecycle calls of every mock, in call order.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct MockRenderer {
    pub name: String,
    pub log: EventLog,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub redraws: AtomicUsize,
}

impl MockRenderer {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self { name: name.to_string(), log: log.clone(), fail_start: false, fail_stop: false, redraws: AtomicUsize::new(0) }
    }

    pub fn redraws(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }
}

impl Plugin for MockRenderer {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Renderer for MockRenderer {
    fn start(&self, width: u32, height: u32, display_name: &str) -> Result<(), PluginError> {
        self.log.record(format!("start {} {}x{} {}", self.name, width, height, display_name));
        if self.fail_start {
            return Err(PluginError::new("no display"));
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), PluginError> {
        self.log.record(format!("stop {}", self.name));
        if self.fail_stop {
            return Err(PluginError::new("stuck"));
        }
        Ok(())
    }

    fn signal_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
    }

    fn layer_type_capabilities(&self, layer_type: LayerType) -> LayerCapabilities {
        match layer_type {
            LayerType::Hardware => LayerCapabilities::POSITION | LayerCapabilities::VISIBILITY,
            _ => LayerCapabilities::all(),
        }
    }

    fn hardware_layer_count(&self, _screen: ScreenId) -> u32 {
        2
    }

    fn screen_resolution(&self, screen: ScreenId) -> Option<(u32, u32)> {
        (screen == ScreenId(0)).then_some((1280, 480))
    }

    fn screen_ids(&self) -> Vec<ScreenId> {
        vec![ScreenId(0)]
    }
}

pub struct MockCommunicator {
    pub name: String,
    pub log: EventLog,
    pub fail_start: bool,
    pub delivered: Mutex<Vec<Notification>>,
}

impl MockCommunicator {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self { name: name.to_string(), log: log.clone(), fail_start: false, delivered: Mutex::new(Vec::new()) }
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }
}

impl Plugin for MockCommunicator {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Communicator for MockCommunicator {
    fn start(&self) -> Result<(), PluginError> {
        self.log.record(format!("start {}", self.name));
        if self.fail_start {
            return Err(PluginError::new("port in use"));
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), PluginError> {
        self.log.record(format!("stop {}", self.name));
        Ok(())
    }

    fn send_notification(&self, notification: &Notification) -> Result<(), PluginError> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Executes a fixed list of commands at startup.
pub struct ScriptedSceneProvider {
    pub name: String,
    pub log: EventLog,
    pub commands: Vec<Command>,
    pub fail: bool,
}

impl Plugin for ScriptedSceneProvider {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SceneProvider for ScriptedSceneProvider {
    fn delegate_scene(&self, executor: &dyn CommandExecutor) -> Result<(), PluginError> {
        self.log.record(format!("delegate {}", self.name));
        for command in &self.commands {
            executor.execute(command.clone());
        }
        if self.fail {
            return Err(PluginError::new("scene file truncated"));
        }
        Ok(())
    }
}

pub struct MockMonitor {
    pub name: String,
    pub log: EventLog,
    pub state: Mutex<HealthState>,
}

impl MockMonitor {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self { name: name.to_string(), log: log.clone(), state: Mutex::new(HealthState::Running) }
    }

    pub fn set_state(&self, state: HealthState) {
        *self.state.lock().unwrap() = state;
    }
}

impl Plugin for MockMonitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn health(&self) -> HealthState {
        *self.state.lock().unwrap()
    }
}

impl HealthMonitor for MockMonitor {
    fn start(&self) -> Result<(), PluginError> {
        self.log.record(format!("start {}", self.name));
        Ok(())
    }

    fn stop(&self) -> Result<(), PluginError> {
        self.log.record(format!("stop {}", self.name));
        Err(PluginError::new("watchdog already closed"))
    }
}
