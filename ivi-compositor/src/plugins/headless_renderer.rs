//! A renderer without a window system.
//!
//! Keeps one logical screen the size of the display and runs the render pass
//! bookkeeping on every redraw: it collects the changed objects, clears their
//! dirty flags and counts the surfaces that would be on screen. Useful on
//! targets whose real renderer is a loadable module that is not installed,
//! and in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, Weak};

use ivi_layermanager::{CommandExecutor, HealthState, Plugin, PluginContext, PluginError, Renderer};
use ivi_scene::{LayerCapabilities, LayerType, ScreenId};
use tracing::{debug, info, trace};

pub const NAME: &str = "headless-renderer";

const SCREEN: ScreenId = ScreenId(0);

#[derive(Debug, Default)]
struct Output {
    running: bool,
    width: u32,
    height: u32,
}

pub struct HeadlessRenderer {
    executor: Weak<dyn CommandExecutor>,
    output: Mutex<Output>,
    frames: AtomicU64,
}

impl HeadlessRenderer {
    pub fn new(context: &PluginContext) -> Self {
        Self { executor: context.executor_weak(), output: Mutex::new(Output::default()), frames: AtomicU64::new(0) }
    }

    /// Render passes run since start.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn output(&self) -> std::sync::MutexGuard<'_, Output> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Plugin for HeadlessRenderer {
    fn name(&self) -> &str {
        NAME
    }

    fn health(&self) -> HealthState {
        if self.executor.strong_count() == 0 {
            HealthState::Error
        } else {
            HealthState::Running
        }
    }
}

impl Renderer for HeadlessRenderer {
    fn start(&self, width: u32, height: u32, display_name: &str) -> Result<(), PluginError> {
        let mut output = self.output();
        if output.running {
            return Err(PluginError::new("already started"));
        }
        *output = Output { running: true, width, height };
        info!(width, height, display = display_name, "Headless output created");
        Ok(())
    }

    fn stop(&self) -> Result<(), PluginError> {
        let mut output = self.output();
        if !output.running {
            return Err(PluginError::new("not running"));
        }
        output.running = false;
        info!(frames = self.frames(), "Headless output destroyed");
        Ok(())
    }

    fn signal_redraw(&self) {
        if !self.output().running {
            return;
        }
        let Some(executor) = self.executor.upgrade() else {
            return;
        };
        let (changed, visible) = {
            let mut scene = executor.scene().lock();
            let changed = scene.take_render_changes();
            let visible = scene.surface_ids().into_iter().filter(|id| scene.is_surface_rendered(*id)).count();
            (changed.len(), visible)
        };
        let frame = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(frame, changed, visible, "Render pass");
        if changed == 0 {
            debug!(frame, "Redraw requested without changes");
        }
    }

    fn layer_type_capabilities(&self, layer_type: LayerType) -> LayerCapabilities {
        match layer_type {
            // No display controller planes.
            LayerType::Hardware => LayerCapabilities::empty(),
            LayerType::Software2D | LayerType::Software2_5D => LayerCapabilities::all(),
        }
    }

    fn hardware_layer_count(&self, _screen: ScreenId) -> u32 {
        0
    }

    fn screen_resolution(&self, screen: ScreenId) -> Option<(u32, u32)> {
        let output = self.output();
        (screen == SCREEN && output.running).then_some((output.width, output.height))
    }

    fn screen_ids(&self) -> Vec<ScreenId> {
        if self.output().running {
            vec![SCREEN]
        } else {
            Vec::new()
        }
    }
}
