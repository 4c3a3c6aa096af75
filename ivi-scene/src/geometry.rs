//! Rectangles, orientations and the viewport mapping between screen space
//! and a node's pixel content.

use std::fmt;

use crate::error::TransformError;

/// An axis-aligned region with a top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Inclusive lower bound, exclusive upper bound on both axes.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x, y) = (i64::from(x), i64::from(y));
        let (left, top) = (i64::from(self.x), i64::from(self.y));
        x >= left && x < left + i64::from(self.width) && y >= top && y < top + i64::from(self.height)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// Clockwise rotation of a node's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Zero,
    Ninety,
    OneEighty,
    TwoSeventy,
}

impl Orientation {
    pub fn degrees(self) -> u32 {
        match self {
            Orientation::Zero => 0,
            Orientation::Ninety => 90,
            Orientation::OneEighty => 180,
            Orientation::TwoSeventy => 270,
        }
    }

    /// Parses a rotation given in degrees. Only multiples of 90 below 360 are valid.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Orientation::Zero),
            90 => Some(Orientation::Ninety),
            180 => Some(Orientation::OneEighty),
            270 => Some(Orientation::TwoSeventy),
            _ => None,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} degree", self.degrees())
    }
}

/// Source and destination regions of a layer or surface.
///
/// The source region is a clip window into the node's own pixels; the
/// destination region places that window on screen. The two sizes differ
/// whenever the node is scaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub source: Rectangle,
    pub destination: Rectangle,
    pub orientation: Orientation,
}

impl Viewport {
    /// A viewport showing `width`x`height` pixels unscaled at the origin.
    pub fn identity(width: u32, height: u32) -> Self {
        let region = Rectangle::new(0, 0, width, height);
        Self { source: region, destination: region, orientation: Orientation::Zero }
    }

    /// Maps a screen point into source pixel coordinates.
    ///
    /// `x' = (x - dest.x) * src.w / dest.w + src.x`, likewise for `y`; the
    /// result is truncated toward zero. With `check_bounds` the point must lie
    /// inside the destination region. Rotated viewports always fail.
    pub fn destination_to_source(&self, x: i32, y: i32, check_bounds: bool) -> Result<(i32, i32), TransformError> {
        if self.orientation != Orientation::Zero {
            return Err(TransformError::UnsupportedOrientation(self.orientation));
        }
        if check_bounds && !self.destination.contains(x, y) {
            return Err(TransformError::OutOfBounds { x, y });
        }
        if self.destination.is_empty() {
            return Err(TransformError::EmptyDestination);
        }

        let scale_x = f64::from(self.source.width) / f64::from(self.destination.width);
        let scale_y = f64::from(self.source.height) / f64::from(self.destination.height);

        let dx = (i64::from(x) - i64::from(self.destination.x)) as f64;
        let dy = (i64::from(y) - i64::from(self.destination.y)) as f64;

        let sx = dx * scale_x + f64::from(self.source.x);
        let sy = dy * scale_y + f64::from(self.source.y);
        Ok((sx as i32, sy as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scaled_viewport() -> Viewport {
        Viewport {
            source: Rectangle::new(0, 0, 400, 300),
            destination: Rectangle::new(0, 0, 800, 480),
            orientation: Orientation::Zero,
        }
    }

    #[rstest]
    #[case(0, 0, (0, 0))]
    #[case(799, 0, (399, 0))]
    #[case(0, 479, (0, 299))]
    #[case(799, 479, (399, 299))]
    #[case(400, 240, (200, 150))]
    fn test_destination_corners_map_to_source(#[case] x: i32, #[case] y: i32, #[case] expected: (i32, i32)) {
        assert_eq!(scaled_viewport().destination_to_source(x, y, true), Ok(expected));
    }

    #[rstest]
    #[case(800, 479)]
    #[case(799, 480)]
    #[case(-1, 0)]
    fn test_points_outside_destination_fail_when_checked(#[case] x: i32, #[case] y: i32) {
        assert_eq!(
            scaled_viewport().destination_to_source(x, y, true),
            Err(TransformError::OutOfBounds { x, y })
        );
    }

    #[test]
    fn test_unchecked_points_outside_are_extrapolated() {
        assert_eq!(scaled_viewport().destination_to_source(800, 480, false), Ok((400, 300)));
    }

    #[test]
    fn test_offsets_translate_both_ways() {
        let viewport = Viewport {
            source: Rectangle::new(10, 20, 100, 100),
            destination: Rectangle::new(200, 100, 200, 50),
            orientation: Orientation::Zero,
        };
        // scale 0.5 horizontally, 2.0 vertically
        assert_eq!(viewport.destination_to_source(200, 100, true), Ok((10, 20)));
        assert_eq!(viewport.destination_to_source(300, 125, true), Ok((60, 70)));
        assert_eq!(viewport.destination_to_source(399, 149, true), Ok((109, 118)));
    }

    #[rstest]
    #[case(Orientation::Ninety)]
    #[case(Orientation::OneEighty)]
    #[case(Orientation::TwoSeventy)]
    fn test_rotated_viewport_is_unsupported(#[case] orientation: Orientation) {
        let viewport = Viewport { orientation, ..scaled_viewport() };
        assert_eq!(
            viewport.destination_to_source(10, 10, true),
            Err(TransformError::UnsupportedOrientation(orientation))
        );
        assert_eq!(
            viewport.destination_to_source(10, 10, false),
            Err(TransformError::UnsupportedOrientation(orientation))
        );
    }

    #[test]
    fn test_empty_destination_reports_error() {
        let viewport = Viewport { destination: Rectangle::new(0, 0, 0, 0), ..scaled_viewport() };
        assert_eq!(viewport.destination_to_source(0, 0, false), Err(TransformError::EmptyDestination));
    }

    #[test]
    fn test_orientation_degrees_round_trip() {
        assert_eq!(Orientation::from_degrees(270), Some(Orientation::TwoSeventy));
        assert_eq!(Orientation::from_degrees(45), None);
        assert_eq!(Orientation::OneEighty.to_string(), "180 degree");
    }
}
