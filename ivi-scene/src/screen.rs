//! Physical screens and the order in which they compose layers.

use crate::object::{LayerId, ScreenId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    id: ScreenId,
    width: u32,
    height: u32,
    render_order: Vec<LayerId>,
}

impl Screen {
    pub fn new(id: ScreenId, width: u32, height: u32) -> Self {
        Self { id, width, height, render_order: Vec::new() }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Layers composed on this screen, bottom first.
    pub fn render_order(&self) -> &[LayerId] {
        &self.render_order
    }

    pub(crate) fn set_render_order(&mut self, layers: Vec<LayerId>) -> bool {
        if self.render_order == layers {
            return false;
        }
        self.render_order = layers;
        true
    }

    pub(crate) fn remove_layer(&mut self, layer: LayerId) -> bool {
        let before = self.render_order.len();
        self.render_order.retain(|l| *l != layer);
        before != self.render_order.len()
    }
}
