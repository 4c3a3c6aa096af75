//! Shader programs shared between scene nodes.
//!
//! A program is identified by the pair of source files it is built from. Any
//! number of client-visible [`Shader`] handles may point at one program; the
//! program lives as long as some handle does, and a handle lives as long as
//! the registry or some node holds it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::error::SceneError;
use crate::object::{next_free_id, ShaderId};

/// Canonical identity of a shader program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderKey {
    pub vertex_file: String,
    pub fragment_file: String,
}

/// A compiled program as far as the scene is concerned.
#[derive(Debug)]
pub struct ShaderProgram {
    key: ShaderKey,
}

impl ShaderProgram {
    pub fn key(&self) -> &ShaderKey {
        &self.key
    }
}

/// A client's handle to a shader program.
#[derive(Debug)]
pub struct Shader {
    id: ShaderId,
    program: Arc<ShaderProgram>,
}

impl Shader {
    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn program(&self) -> &Arc<ShaderProgram> {
        &self.program
    }
}

/// Process-wide lookup of shader handles and the programs behind them.
#[derive(Debug, Default)]
pub struct ShaderRegistry {
    programs: HashMap<ShaderKey, Weak<ShaderProgram>>,
    shaders: HashMap<ShaderId, Arc<Shader>>,
    next_id: u32,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a shader id that has never been handed out.
    pub fn allocate_id(&mut self) -> Result<ShaderId, SceneError> {
        let shaders = &self.shaders;
        next_free_id(&mut self.next_id, "shader", |raw| shaders.contains_key(&ShaderId(raw))).map(ShaderId)
    }

    /// Creates handle `id` for the program built from the given files,
    /// reusing a live program with the same sources.
    pub fn create(&mut self, id: ShaderId, vertex_file: &str, fragment_file: &str) -> Result<Arc<Shader>, SceneError> {
        if self.shaders.contains_key(&id) {
            return Err(SceneError::ShaderIdInUse(id));
        }
        self.programs.retain(|_, program| program.strong_count() > 0);

        let key = ShaderKey {
            vertex_file: vertex_file.to_string(),
            fragment_file: fragment_file.to_string(),
        };
        let program = match self.programs.get(&key).and_then(Weak::upgrade) {
            Some(program) => program,
            None => {
                debug!(vertex = vertex_file, fragment = fragment_file, "creating shader program");
                let program = Arc::new(ShaderProgram { key: key.clone() });
                self.programs.insert(key, Arc::downgrade(&program));
                program
            }
        };

        let shader = Arc::new(Shader { id, program });
        self.shaders.insert(id, Arc::clone(&shader));
        Ok(shader)
    }

    pub fn get(&self, id: ShaderId) -> Option<Arc<Shader>> {
        self.shaders.get(&id).cloned()
    }

    /// Drops the registry's reference. Nodes still using the shader keep it
    /// alive until they switch away from it.
    pub fn destroy(&mut self, id: ShaderId) -> Result<(), SceneError> {
        self.shaders.remove(&id).map(|_| ()).ok_or(SceneError::UnknownShader(id))
    }

    /// Number of programs that still have at least one holder.
    pub fn live_programs(&self) -> usize {
        self.programs.values().filter(|program| program.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_sources_share_one_program() {
        let mut registry = ShaderRegistry::new();
        let (a, b) = (registry.allocate_id().unwrap(), registry.allocate_id().unwrap());
        let first = registry.create(a, "blur.vert", "blur.frag").unwrap();
        let second = registry.create(b, "blur.vert", "blur.frag").unwrap();

        assert_ne!(first.id(), second.id());
        assert!(Arc::ptr_eq(first.program(), second.program()));
        assert_eq!(registry.live_programs(), 1);
    }

    #[test]
    fn test_program_released_with_last_holder() {
        let mut registry = ShaderRegistry::new();
        let id = registry.allocate_id().unwrap();
        let held_by_node = registry.create(id, "a.vert", "a.frag").unwrap();

        registry.destroy(id).unwrap();
        assert!(registry.get(id).is_none());
        assert_eq!(registry.live_programs(), 1, "node still holds the shader");

        drop(held_by_node);
        assert_eq!(registry.live_programs(), 0);
    }

    #[test]
    fn test_duplicate_and_unknown_ids_are_rejected() {
        let mut registry = ShaderRegistry::new();
        let id = registry.allocate_id().unwrap();
        let _shader = registry.create(id, "a.vert", "a.frag").unwrap();

        assert_eq!(registry.create(id, "b.vert", "b.frag").unwrap_err(), SceneError::ShaderIdInUse(id));
        assert_eq!(registry.destroy(ShaderId(999)).unwrap_err(), SceneError::UnknownShader(ShaderId(999)));
    }

    #[test]
    fn test_allocation_does_not_wrap_to_zero() {
        let mut registry = ShaderRegistry::new();
        registry.next_id = u32::MAX;
        assert_eq!(registry.allocate_id(), Err(SceneError::IdsExhausted("shader")));
        assert_eq!(registry.next_id, u32::MAX);
    }
}
