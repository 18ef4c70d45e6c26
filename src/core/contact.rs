//! Contact snapshots and the per-step snapshot pool.
//!
//! The engine may free its contact object inside or shortly after a
//! callback, so every routed event carries a copy captured at callback
//! time. Pooled snapshots stay readable until the next
//! [`update`](crate::CollisionWorld::update); call
//! [`ContactSnapshot::detached`] for indefinite retention.

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use parking_lot::RwLock;
use rapier2d::geometry::ColliderHandle;

/// Copy-at-capture record of an engine contact.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContactState {
    pub fixtures: Option<(ColliderHandle, ColliderHandle)>,
    pub normal: Vec2,
    pub positions: Vec<Vec2>,
    pub friction: f32,
    pub restitution: f32,
    pub enabled: bool,
    pub touching: bool,
}

/// Handle to a captured contact.
///
/// `clone()` is cheap and keeps aliasing the pooled slot, so a handle held
/// across an `update` reads whatever contact the pool reuses the slot for
/// next. That is safe but rarely what you want; use [`Self::detached`] to
/// keep the data.
#[derive(Clone)]
pub struct ContactSnapshot {
    inner: Arc<RwLock<ContactState>>,
}

impl ContactSnapshot {
    pub(crate) fn new(state: ContactState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub(crate) fn store(&self, state: ContactState) {
        *self.inner.write() = state;
    }

    /// Engine handles of the two fixtures in contact, if the contact
    /// carried them.
    pub fn fixtures(&self) -> Option<(ColliderHandle, ColliderHandle)> {
        self.inner.read().fixtures
    }

    /// World-space contact normal, pointing from the first fixture toward
    /// the second. Zero for sensor overlaps.
    pub fn normal(&self) -> Vec2 {
        self.inner.read().normal
    }

    /// World-space contact positions. Empty for sensor overlaps.
    pub fn positions(&self) -> Vec<Vec2> {
        self.inner.read().positions.clone()
    }

    /// Mixed friction of the two fixtures.
    pub fn friction(&self) -> f32 {
        self.inner.read().friction
    }

    /// Mixed restitution of the two fixtures.
    pub fn restitution(&self) -> f32 {
        self.inner.read().restitution
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.read().enabled
    }

    /// Disable the contact response. Honored when called from a pre-solve
    /// callback; the solver skips the contact for that step.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.write().enabled = enabled;
    }

    pub fn is_touching(&self) -> bool {
        self.inner.read().touching
    }

    /// Deep-copies the current state into a snapshot with no pool
    /// membership, for retention beyond the frame.
    pub fn detached(&self) -> ContactSnapshot {
        ContactSnapshot::new(self.inner.read().clone())
    }
}

impl fmt::Debug for ContactSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        f.debug_struct("ContactSnapshot")
            .field("normal", &state.normal)
            .field("positions", &state.positions)
            .field("enabled", &state.enabled)
            .field("touching", &state.touching)
            .finish()
    }
}

/// Per-step snapshot pool.
///
/// `reset` rewinds the cursor at the start of every step; `capture` then
/// overwrites warm slots in order. Once a capture has to allocate a fresh
/// slot the cursor suspends for the rest of the step and later captures
/// keep appending, so every snapshot handed out this step stays valid
/// through the frame.
pub(crate) struct ContactPool {
    slots: Vec<ContactSnapshot>,
    cursor: Option<usize>,
}

impl ContactPool {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            cursor: Some(0),
        }
    }

    pub fn reset(&mut self) {
        self.cursor = Some(0);
    }

    pub fn capture(&mut self, state: ContactState) -> ContactSnapshot {
        if let Some(index) = self.cursor {
            if index < self.slots.len() {
                self.cursor = Some(index + 1);
                let slot = self.slots[index].clone();
                slot.store(state);
                return slot;
            }
            self.cursor = None;
        }
        let snapshot = ContactSnapshot::new(state);
        self.slots.push(snapshot.clone());
        snapshot
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
