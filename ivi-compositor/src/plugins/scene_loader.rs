//! Creates the layers listed under `[scene]` in the configuration.

use std::collections::BTreeMap;

use ivi_core::config::LayerSeed;
use ivi_layermanager::{Command, CommandExecutor, CommandKind, Plugin, PluginContext, PluginError, SceneProvider};
use ivi_scene::{LayerId, ObjectRef, Pid, ScreenId};
use tracing::{debug, warn};

pub const NAME: &str = "configured-scene";

pub struct ConfiguredSceneProvider {
    seeds: Vec<LayerSeed>,
    sender: Pid,
}

impl ConfiguredSceneProvider {
    pub fn new(context: &PluginContext) -> Self {
        Self::from_seeds(context.config().scene.layers.clone())
    }

    pub fn from_seeds(seeds: Vec<LayerSeed>) -> Self {
        Self { seeds, sender: std::process::id() }
    }
}

impl Plugin for ConfiguredSceneProvider {
    fn name(&self) -> &str {
        NAME
    }
}

impl SceneProvider for ConfiguredSceneProvider {
    /// Layers are created one by one; their properties and the screen render
    /// orders are queued and applied by a single commit.
    fn delegate_scene(&self, executor: &dyn CommandExecutor) -> Result<(), PluginError> {
        if self.seeds.is_empty() {
            debug!("No initial layers configured");
            return Ok(());
        }

        let mut failed = Vec::new();
        let mut screens: BTreeMap<ScreenId, Vec<LayerId>> = BTreeMap::new();

        for seed in &self.seeds {
            let layer = LayerId(seed.id);
            let created = executor.execute(Command::synchronous(
                self.sender,
                CommandKind::CreateLayer { id: Some(layer), width: seed.width, height: seed.height },
            ));
            if created.is_failure() {
                warn!(layer = seed.id, "Configured layer could not be created");
                failed.push(seed.id);
                continue;
            }
            let target = ObjectRef::Layer(layer);
            executor.execute(Command::asynchronous(self.sender, CommandKind::SetOpacity { target, opacity: seed.opacity }));
            executor.execute(Command::asynchronous(self.sender, CommandKind::SetVisibility { target, visible: seed.visible }));
            screens.entry(ScreenId(seed.screen)).or_default().push(layer);
        }

        for (screen, layers) in screens {
            executor.execute(Command::asynchronous(self.sender, CommandKind::ScreenSetRenderOrder { screen, layers }));
        }
        let committed = executor.execute(Command::synchronous(self.sender, CommandKind::Commit));

        if !failed.is_empty() {
            return Err(PluginError::new(format!("layers {:?} could not be created", failed)));
        }
        if committed.is_failure() {
            return Err(PluginError::new("initial layer properties were rejected"));
        }
        debug!(layers = self.seeds.len(), "Configured scene created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivi_core::DisplayConfig;
    use ivi_layermanager::Layermanager;
    use ivi_scene::GraphicalObject;
    use pretty_assertions::assert_eq;

    fn seed(id: u32, screen: u32, opacity: f64) -> LayerSeed {
        LayerSeed { id, width: 800, height: 480, visible: true, opacity, screen }
    }

    fn manager_with_screen() -> Layermanager {
        let lm = Layermanager::new(DisplayConfig::default());
        lm.scene().lock().add_screen(ScreenId(0), 800, 480);
        lm
    }

    #[test]
    fn test_layers_are_created_and_ordered() {
        let lm = manager_with_screen();
        let provider = ConfiguredSceneProvider::from_seeds(vec![seed(1000, 0, 1.0), seed(2000, 0, 0.5)]);

        provider.delegate_scene(&lm).unwrap();

        let scene = lm.scene().lock();
        assert_eq!(scene.screen(ScreenId(0)).unwrap().render_order(), &[LayerId(1000), LayerId(2000)]);
        let layer = scene.layer(LayerId(2000)).unwrap();
        assert!(layer.visibility());
        assert_eq!(layer.opacity(), 0.5);
        assert_eq!(lm.pending_command_count(std::process::id()), 0);
    }

    #[test]
    fn test_unknown_screen_fails_the_commit() {
        let lm = manager_with_screen();
        let provider = ConfiguredSceneProvider::from_seeds(vec![seed(1, 7, 1.0)]);

        assert!(provider.delegate_scene(&lm).is_err());
        assert!(lm.scene().lock().layer(LayerId(1)).is_some());
    }

    #[test]
    fn test_duplicate_layer_is_reported() {
        let lm = manager_with_screen();
        let provider = ConfiguredSceneProvider::from_seeds(vec![seed(5, 0, 1.0), seed(5, 0, 1.0)]);

        let error = provider.delegate_scene(&lm).unwrap_err();
        assert!(error.message().contains('5'));
        assert_eq!(lm.scene().lock().screen(ScreenId(0)).unwrap().render_order(), &[LayerId(5)]);
    }

    #[test]
    fn test_empty_scene_is_a_no_op() {
        let lm = manager_with_screen();
        ConfiguredSceneProvider::from_seeds(Vec::new()).delegate_scene(&lm).unwrap();
        assert!(lm.scene().lock().layer_ids().is_empty());
    }
}
