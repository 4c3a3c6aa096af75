//! Surfaces: client content with independent source and destination regions.

use crate::geometry::Viewport;
use crate::object::{GraphicalObject, LayerId, ObjectState, Pid, SurfaceId};
use crate::viewport_object::ViewportObject;

#[derive(Debug, Clone)]
pub struct Surface {
    id: SurfaceId,
    state: ObjectState,
    viewport: Viewport,
    original_width: u32,
    original_height: u32,
    layer: Option<LayerId>,
}

impl Surface {
    /// A surface whose content is `width`x`height` pixels, shown unscaled.
    pub fn new(id: SurfaceId, width: u32, height: u32, creator_pid: Pid) -> Self {
        Self {
            id,
            state: ObjectState::new(creator_pid),
            viewport: Viewport::identity(width, height),
            original_width: width,
            original_height: height,
            layer: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Native size of the content before any cropping.
    pub fn original_size(&self) -> (u32, u32) {
        (self.original_width, self.original_height)
    }

    /// Records a new native content size. The regions are left alone.
    pub fn set_original_size(&mut self, width: u32, height: u32) -> bool {
        if (self.original_width, self.original_height) == (width, height) {
            return false;
        }
        self.original_width = width;
        self.original_height = height;
        self.state.damaged = true;
        true
    }

    /// The layer this surface is attached to, if any.
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    pub(crate) fn set_layer(&mut self, layer: Option<LayerId>) {
        self.layer = layer;
    }
}

impl GraphicalObject for Surface {
    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }
}

impl ViewportObject for Surface {
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
    use crate::geometry::Rectangle;

    #[test]
    fn test_new_surface_shows_full_content() {
        let surface = Surface::new(SurfaceId(20), 400, 300, 7);
        assert_eq!(surface.original_size(), (400, 300));
        assert_eq!(surface.source_region(), Rectangle::new(0, 0, 400, 300));
        assert_eq!(surface.layer(), None);
    }

    #[test]
    fn test_scaled_surface_maps_points_into_content() {
        let mut surface = Surface::new(SurfaceId(20), 400, 300, 7);
        surface.set_source_region(Rectangle::new(0, 0, 400, 300));
        surface.set_destination_region(Rectangle::new(0, 0, 800, 480));

        assert_eq!(surface.destination_to_source(799, 479, true), Ok((399, 299)));
        assert!(surface.destination_to_source(800, 480, true).is_err());
    }

    #[test]
    fn test_original_size_change_damages_content() {
        let mut surface = Surface::new(SurfaceId(1), 10, 10, 0);
        surface.take_render_flags();
        assert!(!surface.set_original_size(10, 10));
        assert!(!surface.damaged());
        assert!(surface.set_original_size(20, 10));
        assert!(surface.damaged());
        assert!(!surface.render_property_changed());
    }
}
