//! The scene: every layer, surface and screen, behind one lock.
//!
//! [`Scene::lock`] is the single serialization point of the layer manager.
//! Every batch of command applications, every notification drain and every
//! render pass runs while holding the returned guard. The lock is not
//! re-entrant; hold it for one batch and release it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::SceneError;
use crate::layer::Layer;
use crate::notification::{Notification, NotificationMask, NotificationQueue, PropertySnapshot};
use crate::object::{next_free_id, ClientHandle, GraphicalObject, LayerId, ObjectRef, Pid, ScreenId, SurfaceId};
use crate::screen::Screen;
use crate::shader::ShaderRegistry;
use crate::surface::Surface;
use crate::viewport_object::ViewportObject;

/// Lock-protected owner of the scene graph.
#[derive(Debug, Default)]
pub struct Scene {
    state: Mutex<SceneState>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the scene's critical section.
    ///
    /// A panic while the lock was held leaves the graph as the panicking
    /// command left it; the lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, SceneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The scene graph itself. Only reachable through [`Scene::lock`].
#[derive(Debug, Default)]
pub struct SceneState {
    layers: HashMap<LayerId, Layer>,
    surfaces: HashMap<SurfaceId, Surface>,
    screens: BTreeMap<ScreenId, Screen>,
    notifications: NotificationQueue,
    shaders: ShaderRegistry,
    last_layer_id: u32,
    last_surface_id: u32,
}

impl SceneState {
    // --- id allocation ---

    /// Next free layer id. The counter only moves forward so an id is never
    /// handed out twice.
    pub fn allocate_layer_id(&mut self) -> Result<LayerId, SceneError> {
        let layers = &self.layers;
        next_free_id(&mut self.last_layer_id, "layer", |raw| layers.contains_key(&LayerId(raw))).map(LayerId)
    }

    pub fn allocate_surface_id(&mut self) -> Result<SurfaceId, SceneError> {
        let surfaces = &self.surfaces;
        next_free_id(&mut self.last_surface_id, "surface", |raw| surfaces.contains_key(&SurfaceId(raw)))
            .map(SurfaceId)
    }

    // --- layers ---

    /// Creates a layer. With `id == None` a fresh id is allocated.
    pub fn create_layer(&mut self, id: Option<LayerId>, width: u32, height: u32, creator: Pid) -> Result<LayerId, SceneError> {
        let id = match id {
            Some(id) if self.layers.contains_key(&id) => return Err(SceneError::LayerIdInUse(id)),
            Some(id) => id,
            None => self.allocate_layer_id()?,
        };
        debug!(layer = %id, width, height, creator, "creating layer");
        self.layers.insert(id, Layer::new(id, width, height, creator));
        Ok(id)
    }

    /// Removes a layer, detaching its surfaces and taking it off every screen.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer, SceneError> {
        let layer = self.layers.remove(&id).ok_or(SceneError::UnknownLayer(id))?;
        for surface_id in layer.surfaces() {
            if let Some(surface) = self.surfaces.get_mut(surface_id) {
                surface.set_layer(None);
            }
        }
        for screen in self.screens.values_mut() {
            screen.remove_layer(id);
        }
        self.notifications.discard(ObjectRef::Layer(id));
        debug!(layer = %id, "removed layer");
        Ok(layer)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer, SceneError> {
        self.layers.get_mut(&id).ok_or(SceneError::UnknownLayer(id))
    }

    /// All layer ids in ascending order.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<_> = self.layers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // --- surfaces ---

    pub fn create_surface(&mut self, id: Option<SurfaceId>, width: u32, height: u32, creator: Pid) -> Result<SurfaceId, SceneError> {
        let id = match id {
            Some(id) if self.surfaces.contains_key(&id) => return Err(SceneError::SurfaceIdInUse(id)),
            Some(id) => id,
            None => self.allocate_surface_id()?,
        };
        debug!(surface = %id, width, height, creator, "creating surface");
        self.surfaces.insert(id, Surface::new(id, width, height, creator));
        Ok(id)
    }

    /// Removes a surface and takes it out of its layer.
    pub fn remove_surface(&mut self, id: SurfaceId) -> Result<Surface, SceneError> {
        let surface = self.surfaces.remove(&id).ok_or(SceneError::UnknownSurface(id))?;
        if let Some(layer) = surface.layer().and_then(|layer_id| self.layers.get_mut(&layer_id)) {
            layer.remove_surface(id);
        }
        self.notifications.discard(ObjectRef::Surface(id));
        debug!(surface = %id, "removed surface");
        Ok(surface)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut Surface, SceneError> {
        self.surfaces.get_mut(&id).ok_or(SceneError::UnknownSurface(id))
    }

    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<_> = self.surfaces.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Looks up a layer or surface through its common placement interface.
    pub fn object(&self, object: ObjectRef) -> Option<&dyn ViewportObject> {
        match object {
            ObjectRef::Layer(id) => self.layers.get(&id).map(|l| l as &dyn ViewportObject),
            ObjectRef::Surface(id) => self.surfaces.get(&id).map(|s| s as &dyn ViewportObject),
        }
    }

    pub fn object_mut(&mut self, object: ObjectRef) -> Result<&mut dyn ViewportObject, SceneError> {
        match object {
            ObjectRef::Layer(id) => self
                .layers
                .get_mut(&id)
                .map(|l| l as &mut dyn ViewportObject)
                .ok_or(SceneError::UnknownLayer(id)),
            ObjectRef::Surface(id) => self
                .surfaces
                .get_mut(&id)
                .map(|s| s as &mut dyn ViewportObject)
                .ok_or(SceneError::UnknownSurface(id)),
        }
    }

    // --- layer membership ---

    /// Puts `surface` on top of `layer`. A surface belongs to at most one layer.
    pub fn add_surface_to_layer(&mut self, layer_id: LayerId, surface_id: SurfaceId) -> Result<bool, SceneError> {
        let surface = self.surfaces.get(&surface_id).ok_or(SceneError::UnknownSurface(surface_id))?;
        match surface.layer() {
            Some(current) if current == layer_id => return Ok(false),
            Some(current) => {
                return Err(SceneError::SurfaceAlreadyOnLayer { surface: surface_id, layer: current });
            }
            None => {}
        }
        let layer = self.layers.get_mut(&layer_id).ok_or(SceneError::UnknownLayer(layer_id))?;
        layer.push_surface(surface_id);
        if let Some(surface) = self.surfaces.get_mut(&surface_id) {
            surface.set_layer(Some(layer_id));
        }
        Ok(true)
    }

    pub fn remove_surface_from_layer(&mut self, layer_id: LayerId, surface_id: SurfaceId) -> Result<bool, SceneError> {
        let layer = self.layers.get_mut(&layer_id).ok_or(SceneError::UnknownLayer(layer_id))?;
        if !self.surfaces.contains_key(&surface_id) {
            return Err(SceneError::UnknownSurface(surface_id));
        }
        if !layer.remove_surface(surface_id) {
            return Err(SceneError::SurfaceNotOnLayer { surface: surface_id, layer: layer_id });
        }
        if let Some(surface) = self.surfaces.get_mut(&surface_id) {
            surface.set_layer(None);
        }
        Ok(true)
    }

    /// Replaces the surfaces of `layer_id`, bottom first. Surfaces dropped
    /// from the list are detached; new ones must not sit on another layer.
    pub fn set_layer_render_order(&mut self, layer_id: LayerId, order: Vec<SurfaceId>) -> Result<bool, SceneError> {
        if !self.layers.contains_key(&layer_id) {
            return Err(SceneError::UnknownLayer(layer_id));
        }
        let mut seen = HashSet::new();
        for surface_id in &order {
            if !seen.insert(*surface_id) {
                return Err(SceneError::DuplicateInRenderOrder(format!("surface {}", surface_id)));
            }
            let surface = self.surfaces.get(surface_id).ok_or(SceneError::UnknownSurface(*surface_id))?;
            if let Some(current) = surface.layer().filter(|current| *current != layer_id) {
                return Err(SceneError::SurfaceAlreadyOnLayer { surface: *surface_id, layer: current });
            }
        }

        let layer = self.layers.get_mut(&layer_id).ok_or(SceneError::UnknownLayer(layer_id))?;
        let previous = layer.surfaces().to_vec();
        if !layer.set_surfaces(order.clone()) {
            return Ok(false);
        }
        for surface_id in previous.iter().filter(|s| !seen.contains(s)) {
            if let Some(surface) = self.surfaces.get_mut(surface_id) {
                surface.set_layer(None);
            }
        }
        for surface_id in &order {
            if let Some(surface) = self.surfaces.get_mut(surface_id) {
                surface.set_layer(Some(layer_id));
            }
        }
        Ok(true)
    }

    // --- screens ---

    /// Registers a screen reported by the renderer. Existing screens keep
    /// their render order.
    pub fn add_screen(&mut self, id: ScreenId, width: u32, height: u32) {
        self.screens.entry(id).or_insert_with(|| Screen::new(id, width, height));
    }

    pub fn screen(&self, id: ScreenId) -> Option<&Screen> {
        self.screens.get(&id)
    }

    pub fn screen_ids(&self) -> Vec<ScreenId> {
        self.screens.keys().copied().collect()
    }

    pub fn set_screen_render_order(&mut self, screen_id: ScreenId, order: Vec<LayerId>) -> Result<bool, SceneError> {
        let mut seen = HashSet::new();
        for layer_id in &order {
            if !seen.insert(*layer_id) {
                return Err(SceneError::DuplicateInRenderOrder(format!("layer {}", layer_id)));
            }
            if !self.layers.contains_key(layer_id) {
                return Err(SceneError::UnknownLayer(*layer_id));
            }
        }
        let screen = self.screens.get_mut(&screen_id).ok_or(SceneError::UnknownScreen(screen_id))?;
        Ok(screen.set_render_order(order))
    }

    /// A surface is on screen iff it and its layer are visible and the layer
    /// is part of some screen's render order.
    pub fn is_surface_rendered(&self, id: SurfaceId) -> bool {
        let Some(surface) = self.surfaces.get(&id) else {
            return false;
        };
        let Some(layer) = surface.layer().and_then(|layer_id| self.layers.get(&layer_id)) else {
            return false;
        };
        surface.visibility()
            && layer.visibility()
            && layer.contains(id)
            && self.screens.values().any(|screen| screen.render_order().contains(&layer.id()))
    }

    // --- shaders ---

    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    pub fn shaders_mut(&mut self) -> &mut ShaderRegistry {
        &mut self.shaders
    }

    // --- notifications ---

    /// Records that `mask` changed on `object` for later delivery.
    pub fn add_client_notification(&mut self, object: ObjectRef, mask: NotificationMask) {
        trace!(%object, ?mask, "queueing notification");
        self.notifications.add(object, mask);
    }

    pub fn pending_notification(&self, object: ObjectRef) -> Option<NotificationMask> {
        self.notifications.pending(object)
    }

    /// Drains the queue into notifications carrying each object's current
    /// values. Objects nobody subscribed to are dropped.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications
            .drain()
            .into_iter()
            .filter_map(|(object, mask)| {
                let node = self.object(object)?;
                if node.subscribers().is_empty() {
                    return None;
                }
                Some(Notification {
                    object,
                    mask,
                    properties: snapshot(node),
                    subscribers: node.subscribers().iter().copied().collect(),
                })
            })
            .collect()
    }

    /// Removes `client` from every subscriber list.
    pub fn remove_client(&mut self, client: ClientHandle) {
        for layer in self.layers.values_mut() {
            layer.remove_subscriber(client);
        }
        for surface in self.surfaces.values_mut() {
            surface.remove_subscriber(client);
        }
    }

    // --- render pass ---

    /// Objects whose render properties changed or whose content was damaged
    /// since the last call. Clears both flags.
    pub fn take_render_changes(&mut self) -> Vec<ObjectRef> {
        let mut changed = Vec::new();
        for (id, layer) in self.layers.iter_mut() {
            if layer.take_render_flags() != (false, false) {
                changed.push(ObjectRef::Layer(*id));
            }
        }
        for (id, surface) in self.surfaces.iter_mut() {
            if surface.take_render_flags() != (false, false) {
                changed.push(ObjectRef::Surface(*id));
            }
        }
        changed.sort_unstable();
        changed
    }
}

fn snapshot(node: &dyn ViewportObject) -> PropertySnapshot {
    PropertySnapshot {
        opacity: node.opacity(),
        visibility: node.visibility(),
        orientation: node.orientation(),
        source_region: node.source_region(),
        destination_region: node.destination_region(),
        chroma_key: node.chroma_key(),
        creator_pid: node.creator_pid(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use pretty_assertions::assert_eq;

    static_assertions::assert_impl_all!(Scene: Send, Sync);

    fn scene_with_layer_and_surface() -> SceneState {
        let mut state = SceneState::default();
        state.create_layer(Some(LayerId(10)), 800, 480, 1).unwrap();
        state.create_surface(Some(SurfaceId(20)), 400, 300, 1).unwrap();
        state
    }

    #[test]
    fn test_explicit_ids_must_not_collide() {
        let mut state = scene_with_layer_and_surface();
        assert_eq!(state.create_layer(Some(LayerId(10)), 1, 1, 1), Err(SceneError::LayerIdInUse(LayerId(10))));
        assert_eq!(
            state.create_surface(Some(SurfaceId(20)), 1, 1, 1),
            Err(SceneError::SurfaceIdInUse(SurfaceId(20)))
        );
    }

    #[test]
    fn test_allocated_ids_skip_taken_and_never_repeat() {
        let mut state = SceneState::default();
        state.create_layer(Some(LayerId(1)), 1, 1, 0).unwrap();
        let first = state.allocate_layer_id().unwrap();
        assert_eq!(first, LayerId(2));

        state.create_layer(Some(first), 1, 1, 0).unwrap();
        state.remove_layer(first).unwrap();
        assert_eq!(state.allocate_layer_id(), Ok(LayerId(3)));
        assert_eq!(state.create_layer(None, 1, 1, 0), Ok(LayerId(4)));
    }

    #[test]
    fn test_id_allocation_stops_at_the_end_of_the_range() {
        let mut state = SceneState::default();
        state.last_layer_id = u32::MAX - 1;
        state.last_surface_id = u32::MAX;

        assert_eq!(state.allocate_layer_id(), Ok(LayerId(u32::MAX)));
        assert_eq!(state.allocate_layer_id(), Err(SceneError::IdsExhausted("layer")));
        assert_eq!(state.create_layer(None, 1, 1, 0), Err(SceneError::IdsExhausted("layer")));
        assert_eq!(state.allocate_surface_id(), Err(SceneError::IdsExhausted("surface")));
        // Explicit ids still work.
        assert_eq!(state.create_surface(Some(SurfaceId(5)), 1, 1, 0), Ok(SurfaceId(5)));
    }

    #[test]
    fn test_surface_joins_single_layer() {
        let mut state = scene_with_layer_and_surface();
        state.create_layer(Some(LayerId(11)), 800, 480, 1).unwrap();

        assert_eq!(state.add_surface_to_layer(LayerId(10), SurfaceId(20)), Ok(true));
        assert_eq!(state.add_surface_to_layer(LayerId(10), SurfaceId(20)), Ok(false));
        assert_eq!(
            state.add_surface_to_layer(LayerId(11), SurfaceId(20)),
            Err(SceneError::SurfaceAlreadyOnLayer { surface: SurfaceId(20), layer: LayerId(10) })
        );
        assert_eq!(state.surface(SurfaceId(20)).unwrap().layer(), Some(LayerId(10)));
    }

    #[test]
    fn test_unknown_ids_are_rejected_without_side_effects() {
        let mut state = scene_with_layer_and_surface();
        assert_eq!(
            state.add_surface_to_layer(LayerId(99), SurfaceId(20)),
            Err(SceneError::UnknownLayer(LayerId(99)))
        );
        assert_eq!(state.surface(SurfaceId(20)).unwrap().layer(), None);
        assert!(state.object_mut(ObjectRef::Surface(SurfaceId(99))).is_err());
        assert!(state.remove_layer(LayerId(99)).is_err());
        assert_eq!(state.layer_ids(), vec![LayerId(10)]);
    }

    #[test]
    fn test_removing_layer_detaches_surfaces_and_screens() {
        let mut state = scene_with_layer_and_surface();
        state.add_screen(ScreenId(0), 800, 480);
        state.add_surface_to_layer(LayerId(10), SurfaceId(20)).unwrap();
        state.set_screen_render_order(ScreenId(0), vec![LayerId(10)]).unwrap();

        state.remove_layer(LayerId(10)).unwrap();
        assert_eq!(state.surface(SurfaceId(20)).unwrap().layer(), None);
        assert!(state.screen(ScreenId(0)).unwrap().render_order().is_empty());
    }

    #[test]
    fn test_removing_surface_takes_it_off_its_layer() {
        let mut state = scene_with_layer_and_surface();
        state.add_surface_to_layer(LayerId(10), SurfaceId(20)).unwrap();
        state.remove_surface(SurfaceId(20)).unwrap();
        assert!(state.layer(LayerId(10)).unwrap().surfaces().is_empty());
    }

    #[test]
    fn test_layer_render_order_reassigns_membership() {
        let mut state = scene_with_layer_and_surface();
        state.create_surface(Some(SurfaceId(21)), 10, 10, 1).unwrap();
        state.add_surface_to_layer(LayerId(10), SurfaceId(20)).unwrap();

        assert_eq!(state.set_layer_render_order(LayerId(10), vec![SurfaceId(21)]), Ok(true));
        assert_eq!(state.surface(SurfaceId(20)).unwrap().layer(), None);
        assert_eq!(state.surface(SurfaceId(21)).unwrap().layer(), Some(LayerId(10)));
        assert_eq!(state.set_layer_render_order(LayerId(10), vec![SurfaceId(21)]), Ok(false));
        assert!(matches!(
            state.set_layer_render_order(LayerId(10), vec![SurfaceId(21), SurfaceId(21)]),
            Err(SceneError::DuplicateInRenderOrder(_))
        ));
    }

    #[test]
    fn test_surface_rendered_only_through_visible_layer_on_screen() {
        let mut state = scene_with_layer_and_surface();
        state.add_screen(ScreenId(0), 800, 480);
        state.add_surface_to_layer(LayerId(10), SurfaceId(20)).unwrap();
        state.surface_mut(SurfaceId(20)).unwrap().set_visibility(true);
        state.layer_mut(LayerId(10)).unwrap().set_visibility(true);
        assert!(!state.is_surface_rendered(SurfaceId(20)), "layer not in any render order");

        state.set_screen_render_order(ScreenId(0), vec![LayerId(10)]).unwrap();
        assert!(state.is_surface_rendered(SurfaceId(20)));

        state.layer_mut(LayerId(10)).unwrap().set_visibility(false);
        assert!(!state.is_surface_rendered(SurfaceId(20)));
    }

    #[test]
    fn test_drain_reports_current_values_to_subscribers() {
        let mut state = scene_with_layer_and_surface();
        let client = ClientHandle::new(5);
        let surface = ObjectRef::Surface(SurfaceId(20));
        state.object_mut(surface).unwrap().add_subscriber(client);

        state.object_mut(surface).unwrap().set_opacity(0.5);
        state.add_client_notification(surface, NotificationMask::OPACITY);
        state.object_mut(surface).unwrap().set_opacity(0.8);
        state.add_client_notification(surface, NotificationMask::OPACITY);
        // Nobody listens to the layer.
        state.add_client_notification(ObjectRef::Layer(LayerId(10)), NotificationMask::VISIBILITY);

        let drained = state.drain_notifications();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].object, surface);
        assert_eq!(drained[0].mask, NotificationMask::OPACITY);
        assert_eq!(drained[0].properties.opacity, 0.8);
        assert_eq!(drained[0].properties.source_region, Rectangle::new(0, 0, 400, 300));
        assert_eq!(drained[0].subscribers, vec![client]);
        assert!(state.drain_notifications().is_empty());
    }

    #[test]
    fn test_removed_client_no_longer_subscribed() {
        let mut state = scene_with_layer_and_surface();
        let client = ClientHandle::new(5);
        state.layer_mut(LayerId(10)).unwrap().add_subscriber(client);
        state.remove_client(client);
        assert!(state.layer(LayerId(10)).unwrap().subscribers().is_empty());
    }

    #[test]
    fn test_render_changes_are_reported_once() {
        let mut state = scene_with_layer_and_surface();
        assert_eq!(
            state.take_render_changes(),
            vec![ObjectRef::Layer(LayerId(10)), ObjectRef::Surface(SurfaceId(20))]
        );
        assert!(state.take_render_changes().is_empty());

        state.surface_mut(SurfaceId(20)).unwrap().mark_damaged();
        assert_eq!(state.take_render_changes(), vec![ObjectRef::Surface(SurfaceId(20))]);
    }
}
