//! Layers: ordered containers of surfaces with their own placement.

use bitflags::bitflags;

use crate::geometry::Viewport;
use crate::object::{GraphicalObject, LayerId, ObjectState, Pid, SurfaceId};
use crate::viewport_object::ViewportObject;

/// How a layer is composed by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LayerType {
    /// Scanned out by a display controller plane.
    Hardware,
    /// Composed by the renderer in 2D.
    #[default]
    Software2D,
    /// Composed by the renderer with perspective effects.
    Software2_5D,
}

bitflags! {
    /// Properties a renderer can honour for a given [`LayerType`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerCapabilities: u32 {
        const POSITION = 1 << 0;
        const DIMENSION = 1 << 1;
        const OPACITY = 1 << 2;
        const VISIBILITY = 1 << 3;
        const SOURCE_REGION = 1 << 4;
        const ORIENTATION = 1 << 5;
        const CHROMA_KEY = 1 << 6;
    }
}

/// A layer and the z-ordered ids of the surfaces it shows.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    layer_type: LayerType,
    state: ObjectState,
    viewport: Viewport,
    surfaces: Vec<SurfaceId>,
}

impl Layer {
    pub fn new(id: LayerId, width: u32, height: u32, creator_pid: Pid) -> Self {
        Self {
            id,
            layer_type: LayerType::default(),
            state: ObjectState::new(creator_pid),
            viewport: Viewport::identity(width, height),
            surfaces: Vec::new(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn layer_type(&self) -> LayerType {
        self.layer_type
    }

    /// Changes how the renderer composes the layer.
    pub fn set_layer_type(&mut self, layer_type: LayerType) -> bool {
        if self.layer_type == layer_type {
            return false;
        }
        self.layer_type = layer_type;
        self.state.render_property_changed = true;
        true
    }

    /// Surfaces in render order, bottom first.
    pub fn surfaces(&self) -> &[SurfaceId] {
        &self.surfaces
    }

    pub fn contains(&self, surface: SurfaceId) -> bool {
        self.surfaces.contains(&surface)
    }

    /// Puts `surface` on top. Returns `false` if it was already present.
    pub(crate) fn push_surface(&mut self, surface: SurfaceId) -> bool {
        if self.contains(surface) {
            return false;
        }
        self.surfaces.push(surface);
        self.state.render_property_changed = true;
        true
    }

    pub(crate) fn remove_surface(&mut self, surface: SurfaceId) -> bool {
        let before = self.surfaces.len();
        self.surfaces.retain(|s| *s != surface);
        let removed = self.surfaces.len() != before;
        if removed {
            self.state.render_property_changed = true;
        }
        removed
    }

    /// Replaces the render order. Returns `false` if it is unchanged.
    pub(crate) fn set_surfaces(&mut self, surfaces: Vec<SurfaceId>) -> bool {
        if self.surfaces == surfaces {
            return false;
        }
        self.surfaces = surfaces;
        self.state.render_property_changed = true;
        true
    }
}

impl GraphicalObject for Layer {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }
}

impl ViewportObject for Layer {
    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn parts_mut(&mut self) -> (&mut Viewport, &mut ObjectState) {
        (&mut self.viewport, &mut self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Orientation, Rectangle};
    use crate::object::Rgb;

    fn clean_layer() -> Layer {
        let mut layer = Layer::new(LayerId(10), 800, 480, 42);
        layer.take_render_flags();
        layer
    }

    #[test]
    fn test_new_layer_is_dirty_and_hidden() {
        let layer = Layer::new(LayerId(10), 800, 480, 42);
        assert!(layer.render_property_changed());
        assert!(!layer.visibility());
        assert_eq!(layer.opacity(), 1.0);
        assert_eq!(layer.creator_pid(), 42);
        assert_eq!(layer.destination_region(), Rectangle::new(0, 0, 800, 480));
        assert_eq!(layer.source_region(), Rectangle::new(0, 0, 800, 480));
    }

    #[test]
    fn test_setters_with_current_value_are_noops() {
        let mut layer = clean_layer();
        assert!(!layer.set_opacity(1.0));
        assert!(!layer.set_visibility(false));
        assert!(!layer.set_chroma_key_enabled(false));
        assert!(!layer.set_chroma_key(Rgb::default()));
        assert!(!layer.set_orientation(Orientation::Zero));
        assert!(!layer.set_source_region(Rectangle::new(0, 0, 800, 480)));
        assert!(!layer.set_destination_region(Rectangle::new(0, 0, 800, 480)));
        assert!(!layer.set_position(0, 0));
        assert!(!layer.set_dimension(800, 480));
        assert!(!layer.render_property_changed());
    }

    #[test]
    fn test_each_changing_setter_marks_dirty() {
        let changes: [fn(&mut Layer) -> bool; 9] = [
            |l: &mut Layer| l.set_opacity(0.5),
            |l: &mut Layer| l.set_visibility(true),
            |l: &mut Layer| l.set_chroma_key_enabled(true),
            |l: &mut Layer| l.set_chroma_key(Rgb::new(255, 0, 255)),
            |l: &mut Layer| l.set_orientation(Orientation::Ninety),
            |l: &mut Layer| l.set_source_region(Rectangle::new(0, 0, 400, 240)),
            |l: &mut Layer| l.set_destination_region(Rectangle::new(10, 10, 800, 480)),
            |l: &mut Layer| l.set_position(5, 5),
            |l: &mut Layer| l.set_dimension(640, 480),
        ];
        for (index, change) in changes.iter().enumerate() {
            let mut layer = clean_layer();
            assert!(change(&mut layer), "setter #{} should report a change", index);
            assert!(layer.render_property_changed(), "setter #{} should mark dirty", index);
        }
    }

    #[test]
    fn test_layer_type_change_marks_dirty_once() {
        let mut layer = clean_layer();
        assert_eq!(layer.layer_type(), LayerType::Software2D);
        assert!(!layer.set_layer_type(LayerType::Software2D));
        assert!(!layer.render_property_changed());

        assert!(layer.set_layer_type(LayerType::Hardware));
        assert_eq!(layer.layer_type(), LayerType::Hardware);
        assert!(layer.render_property_changed());
    }

    #[test]
    fn test_position_and_dimension_touch_only_their_half() {
        let mut layer = clean_layer();
        layer.set_position(100, 50);
        layer.set_dimension(320, 240);
        assert_eq!(layer.destination_region(), Rectangle::new(100, 50, 320, 240));
    }

    #[test]
    fn test_surface_order_is_insertion_order() {
        let mut layer = clean_layer();
        assert!(layer.push_surface(SurfaceId(3)));
        assert!(layer.push_surface(SurfaceId(1)));
        assert!(!layer.push_surface(SurfaceId(3)));
        assert_eq!(layer.surfaces(), &[SurfaceId(3), SurfaceId(1)]);

        assert!(layer.remove_surface(SurfaceId(3)));
        assert!(!layer.remove_surface(SurfaceId(3)));
        assert_eq!(layer.surfaces(), &[SurfaceId(1)]);
    }
}
