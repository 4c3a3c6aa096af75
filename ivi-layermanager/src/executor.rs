//! The interface plugins use to drive the layer manager.

use ivi_scene::{
    ClientHandle, LayerCapabilities, LayerId, LayerType, Scene, SceneError, ScreenId, ShaderId, SurfaceId,
};

use crate::application::ApplicationReference;
use crate::command::{Command, ExecutionResult};
use crate::plugin::HealthState;

/// Executes commands on behalf of clients.
///
/// Implementations must accept calls from several communicator threads at
/// once; the scene lock is the only serialization point.
pub trait CommandExecutor: Send + Sync {
    /// Runs or queues `command` according to its execution type.
    fn execute(&self, command: Command) -> ExecutionResult;

    /// Reserves a layer id for a later `CreateLayer`. Fails once the id
    /// range is used up; ids are never handed out twice.
    fn allocate_layer_id(&self) -> Result<LayerId, SceneError>;
    fn allocate_surface_id(&self) -> Result<SurfaceId, SceneError>;
    fn allocate_shader_id(&self) -> Result<ShaderId, SceneError>;

    fn add_application_reference(&self, reference: ApplicationReference);
    /// Forgets a disconnected client. Its queued commands are discarded only
    /// if it had completed the handshake.
    fn remove_application_reference(&self, client: ClientHandle);

    /// Aggregate plugin health; the first non-running plugin wins.
    fn health(&self) -> HealthState;

    /// Read access for renderers and communicators. Lock it briefly.
    fn scene(&self) -> &Scene;

    fn layer_type_capabilities(&self, layer_type: LayerType) -> LayerCapabilities;
    fn hardware_layer_count(&self, screen: ScreenId) -> u32;
    fn screen_resolution(&self, screen: ScreenId) -> Option<(u32, u32)>;
    fn screen_ids(&self) -> Vec<ScreenId>;
}
