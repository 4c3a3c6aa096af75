//! Error types for scene mutations and coordinate transforms.

use thiserror::Error;

use crate::object::{LayerId, ScreenId, ShaderId, SurfaceId};

/// Why a scene mutation was rejected.
///
/// Commands never propagate these: they turn them into a failed execution
/// result and the executor logs the message with the sender attached.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("layer {0} does not exist")]
    UnknownLayer(LayerId),

    #[error("surface {0} does not exist")]
    UnknownSurface(SurfaceId),

    #[error("screen {0} does not exist")]
    UnknownScreen(ScreenId),

    #[error("shader {0} does not exist")]
    UnknownShader(ShaderId),

    #[error("layer id {0} is already in use")]
    LayerIdInUse(LayerId),

    #[error("surface id {0} is already in use")]
    SurfaceIdInUse(SurfaceId),

    #[error("shader id {0} is already in use")]
    ShaderIdInUse(ShaderId),

    #[error("opacity {0} is outside [0.0, 1.0]")]
    InvalidOpacity(f64),

    #[error("region {width}x{height} has an empty extent")]
    EmptyRegion { width: u32, height: u32 },

    #[error("surface {surface} already belongs to layer {layer}")]
    SurfaceAlreadyOnLayer { surface: SurfaceId, layer: LayerId },

    #[error("surface {surface} is not part of layer {layer}")]
    SurfaceNotOnLayer { surface: SurfaceId, layer: LayerId },

    #[error("render order lists {0} more than once")]
    DuplicateInRenderOrder(String),

    /// Every id of this kind has been handed out.
    #[error("no {0} ids left to allocate")]
    IdsExhausted(&'static str),
}

/// Why a destination point could not be mapped into source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("point ({x}, {y}) lies outside the destination region")]
    OutOfBounds { x: i32, y: i32 },

    /// Hit-testing rotated content is not supported.
    #[error("cannot map coordinates through a {0} rotation")]
    UnsupportedOrientation(crate::geometry::Orientation),

    #[error("destination region has an empty extent")]
    EmptyDestination,
}
