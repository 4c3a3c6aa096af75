//! Identifiers and the state shared by every renderable scene node.
//!
//! Nodes refer to each other only by id; the [`Scene`](crate::scene::Scene)
//! owns the nodes themselves. The [`GraphicalObject`] trait gives layers and
//! surfaces one implementation of the common setters.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::SceneError;
use crate::shader::Shader;

/// Process id of the client that sent a request. `0` means the client never
/// completed its handshake.
pub type Pid = u32;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

object_id!(
    /// Identifies a layer. Unique among layers for the life of the process.
    LayerId
);
object_id!(
    /// Identifies a surface. Unique among surfaces for the life of the process.
    SurfaceId
);
object_id!(
    /// Identifies a physical screen as reported by the renderer.
    ScreenId
);
object_id!(
    /// Client-visible handle to a shader program.
    ShaderId
);

/// Moves `counter` forward to the next raw id for which `taken` is false.
/// The counter never wraps, so 0 and ids handed out earlier are never returned.
pub(crate) fn next_free_id(
    counter: &mut u32,
    kind: &'static str,
    taken: impl Fn(u32) -> bool,
) -> Result<u32, SceneError> {
    loop {
        *counter = counter.checked_add(1).ok_or(SceneError::IdsExhausted(kind))?;
        if !taken(*counter) {
            return Ok(*counter);
        }
    }
}

/// Opaque per-connection handle assigned by a communicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientHandle(u64);

impl ClientHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// A reference to any node that can carry notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectRef {
    Layer(LayerId),
    Surface(SurfaceId),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Layer(id) => write!(f, "layer {}", id),
            ObjectRef::Surface(id) => write!(f, "surface {}", id),
        }
    }
}

/// Chroma key color; pixels of this color are rendered transparent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Properties common to layers and surfaces.
#[derive(Debug, Clone)]
pub struct ObjectState {
    pub(crate) opacity: f64,
    pub(crate) visibility: bool,
    pub(crate) chroma_key_enabled: bool,
    pub(crate) chroma_key: Rgb,
    pub(crate) creator_pid: Pid,
    pub(crate) render_property_changed: bool,
    pub(crate) damaged: bool,
    pub(crate) shader: Option<Arc<Shader>>,
    pub(crate) subscribers: BTreeSet<ClientHandle>,
}

impl ObjectState {
    /// New nodes are fully opaque, hidden and dirty so the first render pass
    /// picks them up.
    pub(crate) fn new(creator_pid: Pid) -> Self {
        Self {
            opacity: 1.0,
            visibility: false,
            chroma_key_enabled: false,
            chroma_key: Rgb::default(),
            creator_pid,
            render_property_changed: true,
            damaged: false,
            shader: None,
            subscribers: BTreeSet::new(),
        }
    }
}

/// Stores `value` into `field` when it differs and flags the node dirty.
/// Returns whether anything changed.
pub(crate) fn update_field<T: PartialEq>(field: &mut T, value: T, dirty: &mut bool) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    *dirty = true;
    true
}

/// Behaviour shared by layers and surfaces.
///
/// Every setter follows the same contract: it returns `true` and marks the
/// node's render properties changed only when the new value differs from the
/// current one. Callers use the return value to decide whether to request a
/// redraw and whether to notify subscribers.
pub trait GraphicalObject {
    fn state(&self) -> &ObjectState;
    fn state_mut(&mut self) -> &mut ObjectState;

    fn opacity(&self) -> f64 {
        self.state().opacity
    }

    fn visibility(&self) -> bool {
        self.state().visibility
    }

    fn creator_pid(&self) -> Pid {
        self.state().creator_pid
    }

    /// The chroma key when enabled.
    fn chroma_key(&self) -> Option<Rgb> {
        let state = self.state();
        state.chroma_key_enabled.then_some(state.chroma_key)
    }

    fn render_property_changed(&self) -> bool {
        self.state().render_property_changed
    }

    fn damaged(&self) -> bool {
        self.state().damaged
    }

    fn shader(&self) -> Option<&Arc<Shader>> {
        self.state().shader.as_ref()
    }

    fn subscribers(&self) -> &BTreeSet<ClientHandle> {
        &self.state().subscribers
    }

    fn set_opacity(&mut self, opacity: f64) -> bool {
        let state = self.state_mut();
        // Compare bit patterns so that -0.0 and 0.0 count as different values.
        if state.opacity.to_bits() == opacity.to_bits() {
            return false;
        }
        state.opacity = opacity;
        state.render_property_changed = true;
        true
    }

    fn set_visibility(&mut self, visible: bool) -> bool {
        let state = self.state_mut();
        update_field(&mut state.visibility, visible, &mut state.render_property_changed)
    }

    fn set_chroma_key_enabled(&mut self, enabled: bool) -> bool {
        let state = self.state_mut();
        update_field(&mut state.chroma_key_enabled, enabled, &mut state.render_property_changed)
    }

    fn set_chroma_key(&mut self, color: Rgb) -> bool {
        let state = self.state_mut();
        update_field(&mut state.chroma_key, color, &mut state.render_property_changed)
    }

    /// Replaces the shader. Dropping the previous handle may release the
    /// program if this node was its last user.
    fn set_shader(&mut self, shader: Option<Arc<Shader>>) -> bool {
        let state = self.state_mut();
        let same = match (&state.shader, &shader) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return false;
        }
        state.shader = shader;
        state.render_property_changed = true;
        true
    }

    /// Marks the content as needing a repaint without changing any property.
    fn mark_damaged(&mut self) {
        self.state_mut().damaged = true;
    }

    /// Returns `(render_property_changed, damaged)` and clears both.
    /// Only the render pass calls this.
    fn take_render_flags(&mut self) -> (bool, bool) {
        let state = self.state_mut();
        let flags = (state.render_property_changed, state.damaged);
        state.render_property_changed = false;
        state.damaged = false;
        flags
    }

    fn add_subscriber(&mut self, client: ClientHandle) -> bool {
        self.state_mut().subscribers.insert(client)
    }

    fn remove_subscriber(&mut self, client: ClientHandle) -> bool {
        self.state_mut().subscribers.remove(&client)
    }
}
