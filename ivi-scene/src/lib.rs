//! # IVI Scene (`ivi-scene`)
//!
//! The scene graph managed by the IVI layer manager: layers, surfaces,
//! screens and the shader programs attached to them, plus the notification
//! queue that tells clients what changed.
//!
//! ## Model
//!
//! - **Layers** hold an ordered list of surfaces (bottom first).
//! - **Surfaces** carry client content and belong to at most one layer.
//! - **Screens** compose an ordered list of layers.
//!
//! Nodes reference each other by typed id ([`LayerId`], [`SurfaceId`],
//! [`ScreenId`]); the [`SceneState`] owns them all. Every property setter
//! returns whether the value changed and flags the node for the next render
//! pass only in that case.
//!
//! ## Locking
//!
//! [`Scene::lock`] guards the whole graph including the notification queue,
//! so one locked section sees command application and notification draining
//! as a single atomic step.
//!
//! ```rust,ignore
//! use ivi_scene::{ObjectRef, Scene, SurfaceId, ViewportObject};
//!
//! let scene = Scene::new();
//! let mut state = scene.lock();
//! let id = state.create_surface(None, 400, 300, std::process::id())?;
//! state.object_mut(ObjectRef::Surface(id))?.set_position(10, 10);
//! ```

pub mod error;
pub mod geometry;
pub mod layer;
pub mod notification;
pub mod object;
pub mod scene;
pub mod screen;
pub mod shader;
pub mod surface;
pub mod viewport_object;

pub use error::{SceneError, TransformError};
pub use geometry::{Orientation, Rectangle, Viewport};
pub use layer::{Layer, LayerCapabilities, LayerType};
pub use notification::{Notification, NotificationMask, NotificationQueue, PropertySnapshot};
pub use object::{ClientHandle, GraphicalObject, LayerId, ObjectRef, Pid, Rgb, ScreenId, ShaderId, SurfaceId};
pub use scene::{Scene, SceneState};
pub use screen::Screen;
pub use shader::{Shader, ShaderRegistry};
pub use surface::Surface;
pub use viewport_object::ViewportObject;
