//! Placement setters shared by layers and surfaces.

use crate::error::TransformError;
use crate::geometry::{Orientation, Rectangle, Viewport};
use crate::object::{update_field, GraphicalObject, ObjectState};

/// A [`GraphicalObject`] that is placed on screen through a [`Viewport`].
///
/// Setters follow the [`GraphicalObject`] contract: `true` and a dirty flag
/// only when the value actually changes.
pub trait ViewportObject: GraphicalObject {
    fn viewport(&self) -> &Viewport;

    /// Both halves at once so a setter can update a field and the dirty flag.
    fn parts_mut(&mut self) -> (&mut Viewport, &mut ObjectState);

    fn source_region(&self) -> Rectangle {
        self.viewport().source
    }

    fn destination_region(&self) -> Rectangle {
        self.viewport().destination
    }

    fn orientation(&self) -> Orientation {
        self.viewport().orientation
    }

    fn set_source_region(&mut self, region: Rectangle) -> bool {
        let (viewport, state) = self.parts_mut();
        update_field(&mut viewport.source, region, &mut state.render_property_changed)
    }

    fn set_destination_region(&mut self, region: Rectangle) -> bool {
        let (viewport, state) = self.parts_mut();
        update_field(&mut viewport.destination, region, &mut state.render_property_changed)
    }

    fn set_orientation(&mut self, orientation: Orientation) -> bool {
        let (viewport, state) = self.parts_mut();
        update_field(&mut viewport.orientation, orientation, &mut state.render_property_changed)
    }

    /// Moves the destination region, keeping its size.
    fn set_position(&mut self, x: u32, y: u32) -> bool {
        let current = self.destination_region();
        self.set_destination_region(Rectangle { x, y, ..current })
    }

    /// Resizes the destination region, keeping its origin.
    fn set_dimension(&mut self, width: u32, height: u32) -> bool {
        let current = self.destination_region();
        self.set_destination_region(Rectangle { width, height, ..current })
    }

    fn destination_to_source(&self, x: i32, y: i32, check_bounds: bool) -> Result<(i32, i32), TransformError> {
        self.viewport().destination_to_source(x, y, check_bounds)
    }
}
