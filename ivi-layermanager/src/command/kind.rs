//! The individual scene mutations and how each one applies itself.

use std::fmt;

use ivi_scene::{
    ClientHandle, LayerId, LayerType, NotificationMask, ObjectRef, Orientation, Pid, Rectangle, Rgb, SceneError,
    SceneState, ScreenId, ShaderId, SurfaceId, ViewportObject,
};

/// What a [`Command`](super::Command) does to the scene.
///
/// Property setters address layers and surfaces alike through an
/// [`ObjectRef`]; structural operations name their ids explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// Creates a layer. `id: None` allocates one.
    CreateLayer { id: Option<LayerId>, width: u32, height: u32 },
    RemoveLayer(LayerId),
    /// Creates a surface. A zero size is allowed until content arrives.
    CreateSurface { id: Option<SurfaceId>, width: u32, height: u32 },
    RemoveSurface(SurfaceId),
    SurfaceSetOriginalSize { surface: SurfaceId, width: u32, height: u32 },
    LayerAddSurface { layer: LayerId, surface: SurfaceId },
    LayerRemoveSurface { layer: LayerId, surface: SurfaceId },
    LayerSetRenderOrder { layer: LayerId, surfaces: Vec<SurfaceId> },
    /// Selects hardware or software composition for a layer.
    LayerSetType { layer: LayerId, layer_type: LayerType },
    ScreenSetRenderOrder { screen: ScreenId, layers: Vec<LayerId> },
    SetOpacity { target: ObjectRef, opacity: f64 },
    SetVisibility { target: ObjectRef, visible: bool },
    SetOrientation { target: ObjectRef, orientation: Orientation },
    SetSourceRegion { target: ObjectRef, region: Rectangle },
    SetDestinationRegion { target: ObjectRef, region: Rectangle },
    SetPosition { target: ObjectRef, x: u32, y: u32 },
    SetDimension { target: ObjectRef, width: u32, height: u32 },
    /// `None` disables chroma keying.
    SetChromaKey { target: ObjectRef, key: Option<Rgb> },
    /// `None` detaches the current shader.
    SetShader { target: ObjectRef, shader: Option<ShaderId> },
    AddNotification { target: ObjectRef, client: ClientHandle },
    RemoveNotification { target: ObjectRef, client: ClientHandle },
    CreateShader { id: ShaderId, vertex_file: String, fragment_file: String },
    DestroyShader(ShaderId),
    /// Applies everything the sender queued asynchronously.
    Commit,
}

impl CommandKind {
    /// Applies a single mutation. `Ok(true)` means something visible changed.
    ///
    /// `Commit` is handled by the executor; on its own it changes nothing.
    pub(crate) fn apply(&self, scene: &mut SceneState, sender: Pid) -> Result<bool, SceneError> {
        match self {
            CommandKind::CreateLayer { id, width, height } => {
                non_empty(*width, *height)?;
                scene.create_layer(*id, *width, *height, sender)?;
                Ok(true)
            }
            CommandKind::RemoveLayer(id) => scene.remove_layer(*id).map(|_| true),
            CommandKind::CreateSurface { id, width, height } => {
                scene.create_surface(*id, *width, *height, sender)?;
                Ok(true)
            }
            CommandKind::RemoveSurface(id) => scene.remove_surface(*id).map(|_| true),
            CommandKind::SurfaceSetOriginalSize { surface, width, height } => {
                let node = scene.surface_mut(*surface)?;
                let (old_width, old_height) = node.original_size();
                if !node.set_original_size(*width, *height) {
                    return Ok(false);
                }
                let had_content = old_width > 0 && old_height > 0;
                let has_content = *width > 0 && *height > 0;
                let mask = match (had_content, has_content) {
                    (false, true) => NotificationMask::CONTENT_AVAILABLE,
                    (true, false) => NotificationMask::CONTENT_REMOVED,
                    _ => NotificationMask::CONFIGURED,
                };
                scene.add_client_notification(ObjectRef::Surface(*surface), mask);
                Ok(true)
            }
            CommandKind::LayerAddSurface { layer, surface } => scene.add_surface_to_layer(*layer, *surface),
            CommandKind::LayerRemoveSurface { layer, surface } => scene.remove_surface_from_layer(*layer, *surface),
            CommandKind::LayerSetRenderOrder { layer, surfaces } => {
                scene.set_layer_render_order(*layer, surfaces.clone())
            }
            CommandKind::LayerSetType { layer, layer_type } => {
                Ok(scene.layer_mut(*layer)?.set_layer_type(*layer_type))
            }
            CommandKind::ScreenSetRenderOrder { screen, layers } => {
                scene.set_screen_render_order(*screen, layers.clone())
            }
            CommandKind::SetOpacity { target, opacity } => {
                if !(0.0..=1.0).contains(opacity) {
                    return Err(SceneError::InvalidOpacity(*opacity));
                }
                set_property(scene, *target, NotificationMask::OPACITY, |node| node.set_opacity(*opacity))
            }
            CommandKind::SetVisibility { target, visible } => {
                set_property(scene, *target, NotificationMask::VISIBILITY, |node| node.set_visibility(*visible))
            }
            CommandKind::SetOrientation { target, orientation } => {
                set_property(scene, *target, NotificationMask::ORIENTATION, |node| {
                    node.set_orientation(*orientation)
                })
            }
            CommandKind::SetSourceRegion { target, region } => {
                non_empty(region.width, region.height)?;
                set_property(scene, *target, NotificationMask::SOURCE_RECT, |node| node.set_source_region(*region))
            }
            CommandKind::SetDestinationRegion { target, region } => {
                non_empty(region.width, region.height)?;
                set_property(scene, *target, NotificationMask::DEST_RECT, |node| {
                    node.set_destination_region(*region)
                })
            }
            CommandKind::SetPosition { target, x, y } => {
                set_property(scene, *target, NotificationMask::DEST_RECT, |node| node.set_position(*x, *y))
            }
            CommandKind::SetDimension { target, width, height } => {
                non_empty(*width, *height)?;
                set_property(scene, *target, NotificationMask::DEST_RECT, |node| {
                    node.set_dimension(*width, *height)
                })
            }
            CommandKind::SetChromaKey { target, key } => {
                let node = scene.object_mut(*target)?;
                let enabled = node.set_chroma_key_enabled(key.is_some());
                let color = key.map_or(false, |color| node.set_chroma_key(color));
                Ok(enabled | color)
            }
            CommandKind::SetShader { target, shader } => {
                let shader = match shader {
                    Some(id) => Some(scene.shaders().get(*id).ok_or(SceneError::UnknownShader(*id))?),
                    None => None,
                };
                Ok(scene.object_mut(*target)?.set_shader(shader))
            }
            CommandKind::AddNotification { target, client } => {
                scene.object_mut(*target)?.add_subscriber(*client);
                Ok(false)
            }
            CommandKind::RemoveNotification { target, client } => {
                scene.object_mut(*target)?.remove_subscriber(*client);
                Ok(false)
            }
            CommandKind::CreateShader { id, vertex_file, fragment_file } => {
                scene.shaders_mut().create(*id, vertex_file, fragment_file)?;
                Ok(false)
            }
            CommandKind::DestroyShader(id) => {
                scene.shaders_mut().destroy(*id)?;
                Ok(false)
            }
            CommandKind::Commit => Ok(false),
        }
    }
}

/// Runs a setter and queues `mask` for subscribers when it changed anything.
fn set_property(
    scene: &mut SceneState,
    target: ObjectRef,
    mask: NotificationMask,
    setter: impl FnOnce(&mut dyn ViewportObject) -> bool,
) -> Result<bool, SceneError> {
    let changed = setter(scene.object_mut(target)?);
    if changed {
        scene.add_client_notification(target, mask);
    }
    Ok(changed)
}

fn non_empty(width: u32, height: u32) -> Result<(), SceneError> {
    if width == 0 || height == 0 {
        return Err(SceneError::EmptyRegion { width, height });
    }
    Ok(())
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::CreateLayer { id: Some(id), width, height } => {
                write!(f, "CreateLayer(id={}, {}x{})", id, width, height)
            }
            CommandKind::CreateLayer { id: None, width, height } => write!(f, "CreateLayer({}x{})", width, height),
            CommandKind::RemoveLayer(id) => write!(f, "RemoveLayer(id={})", id),
            CommandKind::CreateSurface { id: Some(id), width, height } => {
                write!(f, "CreateSurface(id={}, {}x{})", id, width, height)
            }
            CommandKind::CreateSurface { id: None, width, height } => {
                write!(f, "CreateSurface({}x{})", width, height)
            }
            CommandKind::RemoveSurface(id) => write!(f, "RemoveSurface(id={})", id),
            CommandKind::SurfaceSetOriginalSize { surface, width, height } => {
                write!(f, "SurfaceSetOriginalSize(id={}, {}x{})", surface, width, height)
            }
            CommandKind::LayerAddSurface { layer, surface } => {
                write!(f, "LayerAddSurface(layer={}, surface={})", layer, surface)
            }
            CommandKind::LayerRemoveSurface { layer, surface } => {
                write!(f, "LayerRemoveSurface(layer={}, surface={})", layer, surface)
            }
            CommandKind::LayerSetRenderOrder { layer, surfaces } => {
                write!(f, "LayerSetRenderOrder(layer={}, surfaces={})", layer, id_list(surfaces))
            }
            CommandKind::LayerSetType { layer, layer_type } => {
                write!(f, "LayerSetType(layer={}, {:?})", layer, layer_type)
            }
            CommandKind::ScreenSetRenderOrder { screen, layers } => {
                write!(f, "ScreenSetRenderOrder(screen={}, layers={})", screen, id_list(layers))
            }
            CommandKind::SetOpacity { target, opacity } => write!(f, "SetOpacity({}, {})", target, opacity),
            CommandKind::SetVisibility { target, visible } => write!(f, "SetVisibility({}, {})", target, visible),
            CommandKind::SetOrientation { target, orientation } => {
                write!(f, "SetOrientation({}, {})", target, orientation)
            }
            CommandKind::SetSourceRegion { target, region } => write!(f, "SetSourceRegion({}, {})", target, region),
            CommandKind::SetDestinationRegion { target, region } => {
                write!(f, "SetDestinationRegion({}, {})", target, region)
            }
            CommandKind::SetPosition { target, x, y } => write!(f, "SetPosition({}, {}, {})", target, x, y),
            CommandKind::SetDimension { target, width, height } => {
                write!(f, "SetDimension({}, {}x{})", target, width, height)
            }
            CommandKind::SetChromaKey { target, key: Some(key) } => write!(
                f,
                "SetChromaKey({}, rgb({}, {}, {}))",
                target, key.red, key.green, key.blue
            ),
            CommandKind::SetChromaKey { target, key: None } => write!(f, "SetChromaKey({}, off)", target),
            CommandKind::SetShader { target, shader: Some(id) } => write!(f, "SetShader({}, shader={})", target, id),
            CommandKind::SetShader { target, shader: None } => write!(f, "SetShader({}, none)", target),
            CommandKind::AddNotification { target, client } => write!(f, "AddNotification({}, {})", target, client),
            CommandKind::RemoveNotification { target, client } => {
                write!(f, "RemoveNotification({}, {})", target, client)
            }
            CommandKind::CreateShader { id, vertex_file, fragment_file } => {
                write!(f, "CreateShader(id={}, {}, {})", id, vertex_file, fragment_file)
            }
            CommandKind::DestroyShader(id) => write!(f, "DestroyShader(id={})", id),
            CommandKind::Commit => f.write_str("Commit"),
        }
    }
}

fn id_list<T: fmt::Display>(list: &[T]) -> String {
    let joined: Vec<String> = list.iter().map(ToString::to_string).collect();
    format!("[{}]", joined.join(", "))
}
