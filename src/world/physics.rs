//! Engine plumbing: rapier set ownership, stepping, and the dispatcher
//! that translates raw engine callbacks into routed, pooled events.

use glam::Vec2;
use nalgebra::vector;
use parking_lot::Mutex;
use rapier2d::prelude::*;

use crate::collision::routing::{RoutingTable, Transition};
use crate::core::collider::{Collider, CollisionKind, QueuedEvent};
use crate::core::contact::{ContactPool, ContactState};
use crate::utils::arena::{Arena, ColliderId};

pub(crate) fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

pub(crate) fn to_glam(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

pub(crate) fn point_to_glam(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

const TAG_VALID: u128 = 1 << 96;
const TAG_SENSOR: u128 = 1 << 64;

/// Packs a façade collider id and the solid/sensor role into engine
/// user data, so callbacks resolve fixtures without a side table.
pub(crate) fn fixture_tag(id: ColliderId, sensor: bool) -> u128 {
    let sensor_bit = if sensor { TAG_SENSOR } else { 0 };
    TAG_VALID | sensor_bit | id.to_bits() as u128
}

pub(crate) fn decode_tag(data: u128) -> Option<(ColliderId, bool)> {
    if data & TAG_VALID == 0 {
        return None;
    }
    Some((ColliderId::from_bits(data as u64), data & TAG_SENSOR != 0))
}

/// Owns every engine-side set and the stepping pipeline.
pub(crate) struct PhysicsContext {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub pipeline: PhysicsPipeline,
    pub islands: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl PhysicsContext {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn step(&mut self, dt: f32, hooks: &dyn PhysicsHooks, events: &dyn EventHandler) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            hooks,
            events,
        );
    }
}

/// World state the dispatcher mutates from inside engine callbacks. The
/// engine hands `&self` to hooks and event handlers, so the state sits
/// behind a mutex for the duration of the step; the step itself is
/// single-threaded, making every lock uncontended.
pub(crate) struct StepState<'a> {
    pub pool: &'a mut ContactPool,
    pub colliders: &'a mut Arena<Collider>,
}

/// Installed as both the physics hook (pre-solve) and the event handler
/// (enter/exit and post-solve via contact-force reports) for one step.
pub(crate) struct Dispatcher<'a, 'b> {
    pub routing: &'a RoutingTable,
    pub state: &'a Mutex<StepState<'b>>,
}

impl Dispatcher<'_, '_> {
    /// Copies whatever the engine still knows about a contact. Fixtures of
    /// a removed collider resolve to default material values.
    fn snapshot_from_pair(
        colliders: &ColliderSet,
        h1: ColliderHandle,
        h2: ColliderHandle,
        pair: Option<&ContactPair>,
        touching: bool,
    ) -> ContactState {
        let c1 = colliders.get(h1);
        let c2 = colliders.get(h2);
        let friction = match (c1, c2) {
            (Some(a), Some(b)) => (a.friction() * b.friction()).sqrt(),
            _ => 0.0,
        };
        let restitution = match (c1, c2) {
            (Some(a), Some(b)) => a.restitution().max(b.restitution()),
            _ => 0.0,
        };

        let mut normal = Vec2::ZERO;
        let mut positions = Vec::new();
        if let Some(pair) = pair {
            let first_position = colliders.get(pair.collider1).map(|c| *c.position());
            for manifold in &pair.manifolds {
                if manifold.points.is_empty() {
                    continue;
                }
                normal = to_glam(&manifold.data.normal);
                if let Some(iso) = first_position {
                    for point in &manifold.points {
                        positions.push(point_to_glam(&(iso * point.local_p1)));
                    }
                }
            }
        }

        ContactState {
            fixtures: Some((h1, h2)),
            normal,
            positions,
            friction,
            restitution,
            enabled: true,
            touching,
        }
    }

    /// Captures the contact and enqueues it on whichever side the routing
    /// table subscribes, testing both orientations of the raw pair.
    fn route_event(
        &self,
        kind: CollisionKind,
        id1: ColliderId,
        id2: ColliderId,
        sensor: bool,
        state: ContactState,
    ) {
        let transition = match kind {
            CollisionKind::Enter => Transition::Enter,
            CollisionKind::Exit => Transition::Exit,
        };

        let mut guard = self.state.lock();
        let Some(class1) = guard.colliders.get(id1).map(|c| c.class.clone()) else {
            return;
        };
        let Some(class2) = guard.colliders.get(id2).map(|c| c.class.clone()) else {
            return;
        };
        let contact = guard.pool.capture(state);

        if self.routing.should_fire(transition, sensor, &class1, &class2) {
            if let Some(collider) = guard.colliders.get_mut(id1) {
                collider.push_event(
                    &class2,
                    QueuedEvent {
                        kind,
                        other: id2,
                        contact: contact.clone(),
                    },
                );
            }
        }
        if self.routing.should_fire(transition, sensor, &class2, &class1) {
            if let Some(collider) = guard.colliders.get_mut(id2) {
                collider.push_event(
                    &class1,
                    QueuedEvent {
                        kind,
                        other: id1,
                        contact,
                    },
                );
            }
        }
    }
}

impl EventHandler for Dispatcher<'_, '_> {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        let (h1, h2, kind) = match event {
            CollisionEvent::Started(h1, h2, _) => (h1, h2, CollisionKind::Enter),
            CollisionEvent::Stopped(h1, h2, _) => (h1, h2, CollisionKind::Exit),
        };
        let Some((id1, sensor1)) = colliders.get(h1).and_then(|c| decode_tag(c.user_data)) else {
            return;
        };
        let Some((id2, sensor2)) = colliders.get(h2).and_then(|c| decode_tag(c.user_data)) else {
            return;
        };
        // mixed solid/sensor pairings carry no events; each path is
        // serviced by its own fixture pair
        if sensor1 != sensor2 {
            return;
        }

        let touching = kind == CollisionKind::Enter;
        let state = Self::snapshot_from_pair(colliders, h1, h2, contact_pair, touching);
        self.route_event(kind, id1, id2, sensor1, state);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
        let h1 = contact_pair.collider1;
        let h2 = contact_pair.collider2;
        let Some((id1, sensor1)) = colliders.get(h1).and_then(|c| decode_tag(c.user_data)) else {
            return;
        };
        let Some((id2, sensor2)) = colliders.get(h2).and_then(|c| decode_tag(c.user_data)) else {
            return;
        };
        if sensor1 || sensor2 {
            return;
        }

        let mut guard = self.state.lock();
        let Some(class1) = guard.colliders.get(id1).map(|c| c.class.clone()) else {
            return;
        };
        let Some(class2) = guard.colliders.get(id2).map(|c| c.class.clone()) else {
            return;
        };
        let fire1 = self
            .routing
            .should_fire(Transition::PostSolve, false, &class1, &class2)
            && guard.colliders.get(id1).is_some_and(|c| c.post_solve.is_some());
        let fire2 = self
            .routing
            .should_fire(Transition::PostSolve, false, &class2, &class1)
            && guard.colliders.get(id2).is_some_and(|c| c.post_solve.is_some());
        if !fire1 && !fire2 {
            return;
        }

        let mut normal_impulses = Vec::new();
        let mut tangent_impulses = Vec::new();
        for manifold in &contact_pair.manifolds {
            for point in &manifold.points {
                normal_impulses.push(point.data.impulse);
                tangent_impulses.push(point.data.tangent_impulse.x);
            }
        }

        let state = Self::snapshot_from_pair(colliders, h1, h2, Some(contact_pair), true);
        let contact = guard.pool.capture(state);
        let mut callback1 = fire1
            .then(|| guard.colliders.get_mut(id1).and_then(|c| c.post_solve.take()))
            .flatten();
        let mut callback2 = fire2
            .then(|| guard.colliders.get_mut(id2).and_then(|c| c.post_solve.take()))
            .flatten();
        drop(guard);

        if let Some(callback) = callback1.as_mut() {
            callback(id1, id2, &contact, &normal_impulses, &tangent_impulses);
        }
        if let Some(callback) = callback2.as_mut() {
            callback(id2, id1, &contact, &normal_impulses, &tangent_impulses);
        }

        let mut guard = self.state.lock();
        if let Some(callback) = callback1 {
            if let Some(collider) = guard.colliders.get_mut(id1) {
                collider.post_solve = Some(callback);
            }
        }
        if let Some(callback) = callback2 {
            if let Some(collider) = guard.colliders.get_mut(id2) {
                collider.post_solve = Some(callback);
            }
        }
    }
}

impl PhysicsHooks for Dispatcher<'_, '_> {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let Some((id1, sensor1)) = context
            .colliders
            .get(context.collider1)
            .and_then(|c| decode_tag(c.user_data))
        else {
            return;
        };
        let Some((id2, sensor2)) = context
            .colliders
            .get(context.collider2)
            .and_then(|c| decode_tag(c.user_data))
        else {
            return;
        };
        if sensor1 || sensor2 {
            return;
        }

        let mut guard = self.state.lock();
        let Some(class1) = guard.colliders.get(id1).map(|c| c.class.clone()) else {
            return;
        };
        let Some(class2) = guard.colliders.get(id2).map(|c| c.class.clone()) else {
            return;
        };
        let fire1 = self
            .routing
            .should_fire(Transition::PreSolve, false, &class1, &class2)
            && guard.colliders.get(id1).is_some_and(|c| c.pre_solve.is_some());
        let fire2 = self
            .routing
            .should_fire(Transition::PreSolve, false, &class2, &class1)
            && guard.colliders.get(id2).is_some_and(|c| c.pre_solve.is_some());
        if !fire1 && !fire2 {
            return;
        }

        let state = ContactState {
            fixtures: Some((context.collider1, context.collider2)),
            normal: to_glam(context.normal),
            positions: context
                .solver_contacts
                .iter()
                .map(|c| point_to_glam(&c.point))
                .collect(),
            friction: context.solver_contacts.first().map(|c| c.friction).unwrap_or(0.0),
            restitution: context
                .solver_contacts
                .first()
                .map(|c| c.restitution)
                .unwrap_or(0.0),
            enabled: true,
            touching: true,
        };
        let contact = guard.pool.capture(state);
        let mut callback1 = fire1
            .then(|| guard.colliders.get_mut(id1).and_then(|c| c.pre_solve.take()))
            .flatten();
        let mut callback2 = fire2
            .then(|| guard.colliders.get_mut(id2).and_then(|c| c.pre_solve.take()))
            .flatten();
        drop(guard);

        if let Some(callback) = callback1.as_mut() {
            callback(id1, id2, &contact);
        }
        if let Some(callback) = callback2.as_mut() {
            callback(id2, id1, &contact);
        }

        let mut guard = self.state.lock();
        if let Some(callback) = callback1 {
            if let Some(collider) = guard.colliders.get_mut(id1) {
                collider.pre_solve = Some(callback);
            }
        }
        if let Some(callback) = callback2 {
            if let Some(collider) = guard.colliders.get_mut(id2) {
                collider.pre_solve = Some(callback);
            }
        }
        drop(guard);

        if !contact.is_enabled() {
            context.solver_contacts.clear();
        }
    }
}
