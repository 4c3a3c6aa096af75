//! Pending change notifications for subscribed clients.
//!
//! Changes are accumulated per object as a bitmask. Several changes to the
//! same object between two drains collapse into a single entry whose mask is
//! the union of all of them; subscribers get the object's values at drain
//! time, not one message per mutation.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::geometry::{Orientation, Rectangle};
use crate::object::{ClientHandle, ObjectRef, Pid, Rgb};

bitflags! {
    /// Which properties of an object changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NotificationMask: u32 {
        const VISIBILITY = 1;
        const OPACITY = 2;
        const ORIENTATION = 4;
        const SOURCE_RECT = 8;
        const DEST_RECT = 16;
        const CONTENT_AVAILABLE = 32;
        const CONTENT_REMOVED = 64;
        const CONFIGURED = 128;
    }
}

/// Accumulated masks keyed by object, in a deterministic order.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: BTreeMap<ObjectRef, NotificationMask>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// ORs `mask` into the pending entry of `object`, creating it if absent.
    pub fn add(&mut self, object: ObjectRef, mask: NotificationMask) {
        if mask.is_empty() {
            return;
        }
        *self.pending.entry(object).or_insert(NotificationMask::empty()) |= mask;
    }

    pub fn pending(&self, object: ObjectRef) -> Option<NotificationMask> {
        self.pending.get(&object).copied()
    }

    /// Forgets whatever is pending for an object that went away.
    pub fn discard(&mut self, object: ObjectRef) {
        self.pending.remove(&object);
    }

    /// Removes and returns every pending entry.
    pub fn drain(&mut self) -> Vec<(ObjectRef, NotificationMask)> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Property values of an object at the time its notification was drained.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySnapshot {
    pub opacity: f64,
    pub visibility: bool,
    pub orientation: Orientation,
    pub source_region: Rectangle,
    pub destination_region: Rectangle,
    pub chroma_key: Option<Rgb>,
    pub creator_pid: Pid,
}

/// One coalesced notification ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub object: ObjectRef,
    pub mask: NotificationMask,
    pub properties: PropertySnapshot,
    pub subscribers: Vec<ClientHandle>,
}
