//! Collider façade: a body, its named shapes, and the per-frame event
//! queues the polling API reads.

use std::any::Any;
use std::collections::HashMap;

use rapier2d::dynamics::RigidBodyHandle;
use rapier2d::geometry::ColliderHandle;
use uuid::Uuid;

use crate::core::contact::ContactSnapshot;
use crate::core::shapes::ShapeDef;
use crate::utils::arena::ColliderId;

/// Pre-solve callback: `(self, other, contact)`, invoked synchronously
/// inside the physics step. The engine is locked for the duration; the
/// callback must not mutate the world. Calling
/// [`ContactSnapshot::set_enabled`]`(false)` cancels the contact response
/// for this step.
pub type PreSolveFn = Box<dyn FnMut(ColliderId, ColliderId, &ContactSnapshot) + Send>;

/// Post-solve callback: `(self, other, contact, normal_impulses,
/// tangent_impulses)`, invoked synchronously after the solver ran a
/// contact. Same locking contract as [`PreSolveFn`].
pub type PostSolveFn =
    Box<dyn FnMut(ColliderId, ColliderId, &ContactSnapshot, &[f32], &[f32]) + Send>;

/// Transition carried by a queued collision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Enter,
    Exit,
}

/// The peer and contact of one collision, as cached by the polling API.
#[derive(Debug, Clone)]
pub struct CollisionData {
    pub collider: ColliderId,
    pub contact: ContactSnapshot,
}

#[derive(Debug, Clone)]
pub(crate) struct QueuedEvent {
    pub kind: CollisionKind,
    pub other: ColliderId,
    pub contact: ContactSnapshot,
}

/// A named shape and the fixture pair it spawned: the solid fixture carries
/// the class's category/mask, the sensor twin matches everything so events
/// keep flowing between classes that ignore each other physically.
pub(crate) struct ShapeEntry {
    pub def: ShapeDef,
    pub solid: ColliderHandle,
    pub sensor: ColliderHandle,
}

/// One collider: a body with named shapes, a collision class, and the
/// frame's routed events.
///
/// Colliders are owned by their [`CollisionWorld`](crate::CollisionWorld)
/// and addressed by [`ColliderId`]; operations that touch the engine
/// (changing class, adding shapes, destroying) live on the world.
pub struct Collider {
    pub(crate) id: ColliderId,
    uuid: Uuid,
    pub(crate) body: RigidBodyHandle,
    pub(crate) class: String,
    pub(crate) shapes: HashMap<String, ShapeEntry>,
    events: HashMap<String, Vec<QueuedEvent>>,
    stay: HashMap<String, Vec<CollisionData>>,
    enter_data: HashMap<String, CollisionData>,
    exit_data: HashMap<String, CollisionData>,
    pub(crate) pre_solve: Option<PreSolveFn>,
    pub(crate) post_solve: Option<PostSolveFn>,
    object: Option<Box<dyn Any + Send>>,
}

impl Collider {
    pub(crate) fn new(body: RigidBodyHandle, class: String) -> Self {
        Self {
            id: ColliderId::new(u32::MAX, 0),
            uuid: Uuid::new_v4(),
            body,
            class,
            shapes: HashMap::new(),
            events: HashMap::new(),
            stay: HashMap::new(),
            enter_data: HashMap::new(),
            exit_data: HashMap::new(),
            pre_solve: None,
            post_solve: None,
            object: None,
        }
    }

    pub fn id(&self) -> ColliderId {
        self.id
    }

    /// Stable identifier independent of slot reuse.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Handle of the engine body backing this collider.
    pub fn body_handle(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collision_class(&self) -> &str {
        &self.class
    }

    pub fn shape_names(&self) -> impl Iterator<Item = &str> {
        self.shapes.keys().map(String::as_str)
    }

    /// Engine handle of a named shape's solid fixture.
    pub fn fixture(&self, shape: &str) -> Option<ColliderHandle> {
        self.shapes.get(shape).map(|entry| entry.solid)
    }

    pub(crate) fn push_event(&mut self, peer: &str, event: QueuedEvent) {
        self.events.entry(peer.to_string()).or_default().push(event);
    }

    pub(crate) fn clear_frame_events(&mut self) {
        for queue in self.events.values_mut() {
            queue.clear();
        }
    }

    /// True when an enter event against `peer` arrived this frame. On the
    /// first match the peer is added to the stay set and the collision is
    /// cached for [`Self::enter_collision_data`]; remaining events stay in
    /// the queue untouched.
    pub fn enter(&mut self, peer: &str) -> bool {
        let Some(queue) = self.events.get(peer) else {
            return false;
        };
        let Some(event) = queue.iter().find(|e| e.kind == CollisionKind::Enter) else {
            return false;
        };
        let data = CollisionData {
            collider: event.other,
            contact: event.contact.clone(),
        };
        self.stay.entry(peer.to_string()).or_default().push(data.clone());
        self.enter_data.insert(peer.to_string(), data);
        true
    }

    /// True when an exit event against `peer` arrived this frame. On the
    /// first match the peer leaves the stay set and the collision is cached
    /// for [`Self::exit_collision_data`].
    pub fn exit(&mut self, peer: &str) -> bool {
        let Some(queue) = self.events.get(peer) else {
            return false;
        };
        let Some(event) = queue.iter().find(|e| e.kind == CollisionKind::Exit) else {
            return false;
        };
        let data = CollisionData {
            collider: event.other,
            contact: event.contact.clone(),
        };
        if let Some(staying) = self.stay.get_mut(peer) {
            if let Some(index) = staying.iter().position(|d| d.collider == event.other) {
                staying.remove(index);
            }
        }
        self.exit_data.insert(peer.to_string(), data);
        true
    }

    /// True while at least one collider of class `peer` is in the stay set,
    /// i.e. between a polled enter and the matching polled exit.
    pub fn stay(&self, peer: &str) -> bool {
        self.stay.get(peer).is_some_and(|s| !s.is_empty())
    }

    /// Last collision cached by a successful [`Self::enter`] poll.
    pub fn enter_collision_data(&self, peer: &str) -> Option<&CollisionData> {
        self.enter_data.get(peer)
    }

    /// Last collision cached by a successful [`Self::exit`] poll.
    pub fn exit_collision_data(&self, peer: &str) -> Option<&CollisionData> {
        self.exit_data.get(peer)
    }

    /// Every collision currently in the stay set for `peer`.
    pub fn stay_collision_data(&self, peer: &str) -> &[CollisionData] {
        self.stay.get(peer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_pre_solve<F>(&mut self, callback: F)
    where
        F: FnMut(ColliderId, ColliderId, &ContactSnapshot) + Send + 'static,
    {
        self.pre_solve = Some(Box::new(callback));
    }

    pub fn set_post_solve<F>(&mut self, callback: F)
    where
        F: FnMut(ColliderId, ColliderId, &ContactSnapshot, &[f32], &[f32]) + Send + 'static,
    {
        self.post_solve = Some(Box::new(callback));
    }

    /// Attach an arbitrary user object to the collider.
    pub fn set_object<T: Any + Send>(&mut self, object: T) {
        self.object = Some(Box::new(object));
    }

    pub fn object<T: Any>(&self) -> Option<&T> {
        self.object.as_deref().and_then(|o| o.downcast_ref())
    }

    pub fn object_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.object.as_deref_mut().and_then(|o| o.downcast_mut())
    }

    /// Removes and returns the attached user object.
    pub fn take_object<T: Any>(&mut self) -> Option<Box<T>> {
        if self.object.as_deref().is_some_and(|o| o.is::<T>()) {
            self.object.take().and_then(|o| o.downcast().ok())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contact::{ContactSnapshot, ContactState};
    use rapier2d::dynamics::RigidBodyHandle;

    fn queued(kind: CollisionKind, other: ColliderId) -> QueuedEvent {
        QueuedEvent {
            kind,
            other,
            contact: ContactSnapshot::new(ContactState::default()),
        }
    }

    fn test_collider() -> Collider {
        Collider::new(RigidBodyHandle::invalid(), "Default".to_string())
    }

    #[test]
    fn enter_then_exit_drives_the_stay_set() {
        let mut collider = test_collider();
        let other = ColliderId::new(1, 0);

        assert!(!collider.enter("Wall"));
        collider.push_event("Wall", queued(CollisionKind::Enter, other));
        assert!(collider.enter("Wall"));
        assert!(collider.stay("Wall"));
        assert_eq!(
            collider.enter_collision_data("Wall").unwrap().collider,
            other
        );

        collider.clear_frame_events();
        assert!(!collider.enter("Wall"));
        assert!(collider.stay("Wall"));

        collider.push_event("Wall", queued(CollisionKind::Exit, other));
        assert!(collider.exit("Wall"));
        assert!(!collider.stay("Wall"));
        assert_eq!(collider.exit_collision_data("Wall").unwrap().collider, other);
    }

    #[test]
    fn polls_against_unknown_peers_are_falsy() {
        let mut collider = test_collider();
        assert!(!collider.enter("NeverRegistered"));
        assert!(!collider.exit("NeverRegistered"));
        assert!(!collider.stay("NeverRegistered"));
        assert!(collider.enter_collision_data("NeverRegistered").is_none());
        assert!(collider.stay_collision_data("NeverRegistered").is_empty());
    }

    #[test]
    fn user_object_round_trip() {
        let mut collider = test_collider();
        collider.set_object(42u32);
        assert_eq!(collider.object::<u32>(), Some(&42));
        assert!(collider.object::<String>().is_none());
        *collider.object_mut::<u32>().unwrap() = 7;
        assert_eq!(*collider.take_object::<u32>().unwrap(), 7);
        assert!(collider.object::<u32>().is_none());
    }
}
