//! World façade: owns the engine, the class registry, the routing table,
//! and every collider.

pub(crate) mod physics;

use glam::Vec2;
use log::debug;
use nalgebra::{point, vector};
use parking_lot::Mutex;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::queries;
use crate::collision::routing::RoutingTable;
use crate::config::{DEFAULT_CLASS, DEFAULT_METER, MAIN_SHAPE, QUERY_DRAW_FRAMES};
use crate::core::classes::{CategoryMask, ClassRegistry, ClassSet, CollisionClassDef};
use crate::core::collider::{Collider, ShapeEntry};
use crate::core::contact::ContactPool;
use crate::core::shapes::ShapeDef;
use crate::debug::{self, DebugRenderer, QueryDraw, QueryShape};
use crate::error::{Result, StrataError};
use crate::utils::arena::{Arena, ColliderId};
use crate::utils::logging::ScopedTimer;

use self::physics::{fixture_tag, to_glam, Dispatcher, PhysicsContext, StepState};

/// Kind of body backing a collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    Static,
    Dynamic,
    Kinematic,
}

impl BodyType {
    fn to_engine(self) -> RigidBodyType {
        match self {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Settings shared by every collider constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderSettings {
    pub body_type: BodyType,
    pub collision_class: String,
}

impl Default for ColliderSettings {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            collision_class: DEFAULT_CLASS.to_string(),
        }
    }
}

impl ColliderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dynamic body in the given class.
    pub fn of_class(class: impl Into<String>) -> Self {
        Self::new().with_collision_class(class)
    }

    /// Static body in the default class.
    pub fn static_body() -> Self {
        Self::new().with_body_type(BodyType::Static)
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    pub fn with_collision_class(mut self, class: impl Into<String>) -> Self {
        self.collision_class = class.into();
        self
    }
}

/// Description of a joint between two colliders. Thin passthrough to the
/// engine's joint kinds; anchors are in each body's local space and each
/// kind keeps its engine signature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointDef {
    /// Locks the two bodies together rigidly.
    Fixed { anchor_a: Vec2, anchor_b: Vec2 },
    /// Free rotation around the shared anchor.
    Revolute { anchor_a: Vec2, anchor_b: Vec2 },
    /// Translation along `axis`, no relative rotation.
    Prismatic {
        anchor_a: Vec2,
        anchor_b: Vec2,
        axis: Vec2,
    },
    /// Spring keeping the anchors near `rest_length` apart.
    Spring {
        anchor_a: Vec2,
        anchor_b: Vec2,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    },
    /// Rope limiting the anchor distance to `length`.
    Rope {
        anchor_a: Vec2,
        anchor_b: Vec2,
        length: f32,
    },
}

/// Handle to a joint created through [`CollisionWorld::add_joint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointHandle(ImpulseJointHandle);

/// The collision-class physics world.
///
/// All operations are single-threaded; during [`Self::update`] the engine
/// is locked and world-mutating calls must not be made from pre/post-solve
/// callbacks.
pub struct CollisionWorld {
    physics: PhysicsContext,
    registry: ClassRegistry,
    routing: RoutingTable,
    colliders: Arena<Collider>,
    pool: ContactPool,
    query_draws: Vec<QueryDraw>,
    explicit_events: bool,
    query_debug: bool,
    meter: f32,
    sleep_allowed: bool,
    user_classes: bool,
}

impl CollisionWorld {
    /// Creates a world with the given gravity. A built-in class
    /// `"Default"` is registered immediately; every collider starts in it
    /// unless its settings say otherwise.
    pub fn new(gravity_x: f32, gravity_y: f32, sleep_allowed: bool) -> Self {
        let mut registry = ClassRegistry::new();
        registry
            .register(DEFAULT_CLASS, CollisionClassDef::new())
            .expect("fresh registry accepts the built-in class");
        let mut routing = RoutingTable::default();
        routing.rebuild(&mut registry, false);

        Self {
            physics: PhysicsContext::new(Vec2::new(gravity_x, gravity_y)),
            registry,
            routing,
            colliders: Arena::new(),
            pool: ContactPool::new(),
            query_draws: Vec::new(),
            explicit_events: false,
            query_debug: false,
            meter: DEFAULT_METER,
            sleep_allowed,
            user_classes: false,
        }
    }

    // ---- configuration -----------------------------------------------

    /// Meter scale hint for games that think in pixels. The engine itself
    /// is unit-agnostic; the value also scales overlay details.
    pub fn set_meter(&mut self, pixels_per_meter: f32) {
        self.meter = pixels_per_meter;
    }

    pub fn meter(&self) -> f32 {
        self.meter
    }

    pub fn gravity(&self) -> Vec2 {
        to_glam(&self.physics.gravity)
    }

    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.physics.gravity = physics::to_na(Vec2::new(x, y));
    }

    /// Record query shapes for the debug overlay.
    pub fn set_query_debug_drawing(&mut self, enabled: bool) {
        self.query_debug = enabled;
    }

    /// Switches event generation from implicit (every pair fires every
    /// transition) to explicit (only declared peers fire). Must be chosen
    /// before any class or collider exists.
    pub fn set_explicit_collision_events(&mut self, explicit: bool) -> Result<()> {
        if self.user_classes || !self.colliders.is_empty() {
            return Err(StrataError::ExplicitEventsLocked);
        }
        self.explicit_events = explicit;
        self.routing.rebuild(&mut self.registry, explicit);
        Ok(())
    }

    // ---- collision classes -------------------------------------------

    /// Registers a collision class, recompiles the category/mask
    /// assignment, reapplies it to every existing fixture, and rebuilds
    /// the routing table.
    pub fn add_collision_class(&mut self, name: &str, def: CollisionClassDef) -> Result<()> {
        self.registry.register(name, def)?;
        self.user_classes = true;
        self.routing.rebuild(&mut self.registry, self.explicit_events);
        self.reapply_masks();
        debug!("registered collision class {name:?}");
        Ok(())
    }

    /// Registers several classes in order.
    pub fn add_collision_class_table<I, S>(&mut self, classes: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, CollisionClassDef)>,
        S: AsRef<str>,
    {
        for (name, def) in classes {
            self.add_collision_class(name.as_ref(), def)?;
        }
        Ok(())
    }

    pub fn has_collision_class(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Compiled category/mask data for a class, if registered.
    pub fn category_mask(&self, class: &str) -> Option<CategoryMask> {
        self.registry.category_mask(class)
    }

    /// Whether the compiled filter lets fixtures of the two classes
    /// generate a physical contact.
    pub fn contact_allowed(&self, a: &str, b: &str) -> bool {
        self.registry.contact_allowed(a, b)
    }

    fn interaction_groups(mask: CategoryMask) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(mask.membership_bits),
            Group::from_bits_truncate(mask.filter_bits),
        )
    }

    fn reapply_masks(&mut self) {
        for collider in self.colliders.iter() {
            let Some(mask) = self.registry.category_mask(&collider.class) else {
                continue;
            };
            let groups = Self::interaction_groups(mask);
            for entry in collider.shapes.values() {
                if let Some(fixture) = self.physics.colliders.get_mut(entry.solid) {
                    fixture.set_collision_groups(groups);
                }
            }
        }
    }

    // ---- colliders ---------------------------------------------------

    pub fn new_circle_collider(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        settings: &ColliderSettings,
    ) -> Result<ColliderId> {
        self.new_collider(x, y, ShapeDef::Circle { radius }, settings)
    }

    pub fn new_rectangle_collider(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        settings: &ColliderSettings,
    ) -> Result<ColliderId> {
        self.new_collider(x, y, ShapeDef::Rectangle { width, height }, settings)
    }

    /// Rectangle with its corners clipped into an octagon by `cut`.
    pub fn new_bsg_rectangle_collider(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        cut: f32,
        settings: &ColliderSettings,
    ) -> Result<ColliderId> {
        self.new_collider(x, y, ShapeDef::BsgRectangle { width, height, cut }, settings)
    }

    /// Convex polygon collider; the body sits at the origin and the
    /// vertices are taken as given.
    pub fn new_polygon_collider(
        &mut self,
        vertices: Vec<Vec2>,
        settings: &ColliderSettings,
    ) -> Result<ColliderId> {
        self.new_collider(0.0, 0.0, ShapeDef::Polygon { vertices }, settings)
    }

    /// Single edge collider between two world points.
    pub fn new_line_collider(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        settings: &ColliderSettings,
    ) -> Result<ColliderId> {
        self.new_collider(
            0.0,
            0.0,
            ShapeDef::Line {
                a: Vec2::new(x1, y1),
                b: Vec2::new(x2, y2),
            },
            settings,
        )
    }

    /// Chain of edges through the given world points, optionally closed
    /// into a loop.
    pub fn new_chain_collider(
        &mut self,
        vertices: Vec<Vec2>,
        closed: bool,
        settings: &ColliderSettings,
    ) -> Result<ColliderId> {
        self.new_collider(0.0, 0.0, ShapeDef::Chain { vertices, closed }, settings)
    }

    /// Creates the body, the façade, and the `"main"` shape.
    pub fn new_collider(
        &mut self,
        x: f32,
        y: f32,
        shape: ShapeDef,
        settings: &ColliderSettings,
    ) -> Result<ColliderId> {
        if !self.registry.contains(&settings.collision_class) {
            return Err(StrataError::UnknownClass(settings.collision_class.clone()));
        }
        let body = RigidBodyBuilder::new(settings.body_type.to_engine())
            .translation(vector![x, y])
            .can_sleep(self.sleep_allowed)
            .build();
        let body_handle = self.physics.bodies.insert(body);
        let id = self
            .colliders
            .insert(Collider::new(body_handle, settings.collision_class.clone()));
        if let Some(collider) = self.colliders.get_mut(id) {
            collider.id = id;
        }

        match self.attach_shape(id, MAIN_SHAPE, shape) {
            Ok(()) => {
                debug!("created {:?} collider {id:?}", settings.body_type);
                Ok(id)
            }
            Err(err) => {
                self.colliders.remove(id);
                self.physics.bodies.remove(
                    body_handle,
                    &mut self.physics.islands,
                    &mut self.physics.colliders,
                    &mut self.physics.impulse_joints,
                    &mut self.physics.multibody_joints,
                    true,
                );
                Err(err)
            }
        }
    }

    /// Adds a named shape to an existing collider: a solid fixture carrying
    /// the class's filter plus its always-matching sensor twin.
    pub fn add_shape(&mut self, id: ColliderId, name: &str, shape: ShapeDef) -> Result<()> {
        if self
            .colliders
            .get(id)
            .is_some_and(|c| c.shapes.contains_key(name))
        {
            return Err(StrataError::DuplicateShape(name.to_string()));
        }
        self.attach_shape(id, name, shape)
    }

    fn attach_shape(&mut self, id: ColliderId, name: &str, shape: ShapeDef) -> Result<()> {
        let Some(collider) = self.colliders.get(id) else {
            return Ok(());
        };
        let body = collider.body;
        let mask = self
            .registry
            .category_mask(&collider.class)
            .ok_or_else(|| StrataError::UnknownClass(collider.class.clone()))?;
        let groups = Self::interaction_groups(mask);

        let (solid, sensor) =
            Self::build_fixture_pair(&mut self.physics, id, body, &shape, groups)?;
        if let Some(collider) = self.colliders.get_mut(id) {
            collider.shapes.insert(
                name.to_string(),
                ShapeEntry {
                    def: shape,
                    solid,
                    sensor,
                },
            );
        }
        Ok(())
    }

    fn build_fixture_pair(
        physics: &mut PhysicsContext,
        id: ColliderId,
        body: RigidBodyHandle,
        shape: &ShapeDef,
        groups: InteractionGroups,
    ) -> Result<(ColliderHandle, ColliderHandle)> {
        let builder = match shape {
            ShapeDef::Circle { radius } => ColliderBuilder::ball(*radius),
            ShapeDef::Rectangle { width, height } => {
                ColliderBuilder::cuboid(width / 2.0, height / 2.0)
            }
            ShapeDef::BsgRectangle { width, height, cut } => {
                let points: Vec<Point<Real>> = ShapeDef::octagon(*width, *height, *cut)
                    .iter()
                    .map(|v| point![v.x, v.y])
                    .collect();
                ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                    StrataError::InvalidShape("corner-cut rectangle has no convex hull".to_string())
                })?
            }
            ShapeDef::Polygon { vertices } => {
                let points: Vec<Point<Real>> =
                    vertices.iter().map(|v| point![v.x, v.y]).collect();
                ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                    StrataError::InvalidShape("polygon has no convex hull".to_string())
                })?
            }
            ShapeDef::Line { a, b } => {
                ColliderBuilder::segment(point![a.x, a.y], point![b.x, b.y])
            }
            ShapeDef::Chain { vertices, closed } => {
                if vertices.len() < 2 {
                    return Err(StrataError::InvalidShape(
                        "chain needs at least two vertices".to_string(),
                    ));
                }
                let points: Vec<Point<Real>> =
                    vertices.iter().map(|v| point![v.x, v.y]).collect();
                let indices = closed.then(|| {
                    let n = points.len() as u32;
                    (0..n).map(|i| [i, (i + 1) % n]).collect::<Vec<[u32; 2]>>()
                });
                ColliderBuilder::polyline(points, indices)
            }
        };

        let solid = builder
            .clone()
            .collision_groups(groups)
            .active_events(ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS)
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .contact_force_event_threshold(0.0)
            .user_data(fixture_tag(id, false))
            .build();
        let sensor = builder
            .sensor(true)
            .density(0.0)
            .collision_groups(InteractionGroups::all())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(fixture_tag(id, true))
            .build();

        let solid_handle = physics
            .colliders
            .insert_with_parent(solid, body, &mut physics.bodies);
        let sensor_handle = physics
            .colliders
            .insert_with_parent(sensor, body, &mut physics.bodies);
        Ok((solid_handle, sensor_handle))
    }

    /// Removes a named shape and its fixture pair. Unknown names and stale
    /// ids are no-ops.
    pub fn remove_shape(&mut self, id: ColliderId, name: &str) {
        let Some(collider) = self.colliders.get_mut(id) else {
            return;
        };
        let Some(entry) = collider.shapes.remove(name) else {
            return;
        };
        for handle in [entry.solid, entry.sensor] {
            self.physics.colliders.remove(
                handle,
                &mut self.physics.islands,
                &mut self.physics.bodies,
                true,
            );
        }
    }

    /// Moves a collider to another class and reapplies the compiled filter
    /// to its solid fixtures (sensors always match everything).
    pub fn set_collision_class(&mut self, id: ColliderId, class: &str) -> Result<()> {
        let Some(mask) = self.registry.category_mask(class) else {
            return Err(StrataError::UnknownClass(class.to_string()));
        };
        let groups = Self::interaction_groups(mask);
        let Some(collider) = self.colliders.get_mut(id) else {
            return Ok(());
        };
        collider.class = class.to_string();
        for entry in collider.shapes.values() {
            if let Some(fixture) = self.physics.colliders.get_mut(entry.solid) {
                fixture.set_collision_groups(groups);
            }
        }
        Ok(())
    }

    /// Destroys a collider: its fixtures, sensors, attached joints, and
    /// body. The façade state (user object included) is dropped. Stale ids
    /// are a no-op.
    pub fn destroy_collider(&mut self, id: ColliderId) {
        let Some(collider) = self.colliders.remove(id) else {
            return;
        };
        self.physics.bodies.remove(
            collider.body,
            &mut self.physics.islands,
            &mut self.physics.colliders,
            &mut self.physics.impulse_joints,
            &mut self.physics.multibody_joints,
            true,
        );
        debug!("destroyed collider {id:?}");
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id)
    }

    pub fn collider_mut(&mut self, id: ColliderId) -> Option<&mut Collider> {
        self.colliders.get_mut(id)
    }

    pub fn collider_ids(&self) -> Vec<ColliderId> {
        self.colliders.ids().collect()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Engine body backing a collider, for forces, velocities, and
    /// position control.
    pub fn body(&self, id: ColliderId) -> Option<&RigidBody> {
        let collider = self.colliders.get(id)?;
        self.physics.bodies.get(collider.body)
    }

    pub fn body_mut(&mut self, id: ColliderId) -> Option<&mut RigidBody> {
        let collider = self.colliders.get(id)?;
        self.physics.bodies.get_mut(collider.body)
    }

    pub fn collider_position(&self, id: ColliderId) -> Option<Vec2> {
        self.body(id).map(|body| to_glam(body.translation()))
    }

    pub fn set_collider_position(&mut self, id: ColliderId, x: f32, y: f32) {
        if let Some(body) = self.body_mut(id) {
            body.set_translation(vector![x, y], true);
        }
    }

    // ---- stepping ----------------------------------------------------

    /// Advances the simulation by `dt` seconds.
    ///
    /// Resets the contact pool cursor, clears every collider's per-frame
    /// event queue, then steps the engine. Enter/exit events raised by the
    /// step land in the queues for polling; pre/post-solve callbacks run
    /// synchronously inside the step.
    pub fn update(&mut self, dt: f32) {
        self.pool.reset();
        for collider in self.colliders.iter_mut() {
            collider.clear_frame_events();
        }

        let _timer = ScopedTimer::new("physics step");
        let state = Mutex::new(StepState {
            pool: &mut self.pool,
            colliders: &mut self.colliders,
        });
        let dispatcher = Dispatcher {
            routing: &self.routing,
            state: &state,
        };
        self.physics.step(dt, &dispatcher, &dispatcher);
    }

    // ---- queries -----------------------------------------------------

    fn record_query(&mut self, shape: QueryShape) {
        if self.query_debug {
            self.query_draws.push(QueryDraw {
                shape,
                frames: QUERY_DRAW_FRAMES,
            });
        }
    }

    /// Colliders with a solid fixture overlapping the disc, filtered by
    /// class (`None` means every class).
    pub fn query_circle_area(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        filter: Option<&ClassSet>,
    ) -> Vec<ColliderId> {
        self.record_query(QueryShape::Circle {
            center: Vec2::new(x, y),
            radius,
        });
        queries::query_circle(&self.physics, &self.colliders, Vec2::new(x, y), radius, filter)
    }

    /// Colliders with a solid fixture overlapping the rectangle whose min
    /// corner is `(x, y)`.
    pub fn query_rectangle_area(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        filter: Option<&ClassSet>,
    ) -> Vec<ColliderId> {
        self.record_query(QueryShape::Rectangle {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
        });
        queries::query_rectangle(&self.physics, &self.colliders, x, y, width, height, filter)
    }

    /// Colliders with a solid fixture overlapping the polygon.
    pub fn query_polygon_area(
        &mut self,
        vertices: &[Vec2],
        filter: Option<&ClassSet>,
    ) -> Vec<ColliderId> {
        self.record_query(QueryShape::Polygon {
            vertices: vertices.to_vec(),
        });
        queries::query_polygon(&self.physics, &self.colliders, vertices, filter)
    }

    /// Colliders whose solid fixtures cross the segment, ordered by
    /// distance along it.
    pub fn query_line(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        filter: Option<&ClassSet>,
    ) -> Vec<ColliderId> {
        let a = Vec2::new(x1, y1);
        let b = Vec2::new(x2, y2);
        self.record_query(QueryShape::Line { a, b });
        queries::query_line(&self.physics, &self.colliders, a, b, filter)
    }

    // ---- joints ------------------------------------------------------

    /// Creates a joint between two colliders, unwrapping them to their
    /// bodies. Returns `None` when either id is stale or the definition is
    /// degenerate.
    pub fn add_joint(
        &mut self,
        def: JointDef,
        a: ColliderId,
        b: ColliderId,
        wake_up: bool,
    ) -> Option<JointHandle> {
        let body_a = self.colliders.get(a)?.body;
        let body_b = self.colliders.get(b)?.body;

        let data: GenericJoint = match def {
            JointDef::Fixed { anchor_a, anchor_b } => FixedJointBuilder::new()
                .local_anchor1(point![anchor_a.x, anchor_a.y])
                .local_anchor2(point![anchor_b.x, anchor_b.y])
                .build()
                .into(),
            JointDef::Revolute { anchor_a, anchor_b } => RevoluteJointBuilder::new()
                .local_anchor1(point![anchor_a.x, anchor_a.y])
                .local_anchor2(point![anchor_b.x, anchor_b.y])
                .build()
                .into(),
            JointDef::Prismatic {
                anchor_a,
                anchor_b,
                axis,
            } => {
                if axis.length_squared() < 1e-12 {
                    return None;
                }
                PrismaticJointBuilder::new(UnitVector::new_normalize(vector![axis.x, axis.y]))
                    .local_anchor1(point![anchor_a.x, anchor_a.y])
                    .local_anchor2(point![anchor_b.x, anchor_b.y])
                    .build()
                    .into()
            }
            JointDef::Spring {
                anchor_a,
                anchor_b,
                rest_length,
                stiffness,
                damping,
            } => SpringJointBuilder::new(rest_length, stiffness, damping)
                .local_anchor1(point![anchor_a.x, anchor_a.y])
                .local_anchor2(point![anchor_b.x, anchor_b.y])
                .build()
                .into(),
            JointDef::Rope {
                anchor_a,
                anchor_b,
                length,
            } => RopeJointBuilder::new(length)
                .local_anchor1(point![anchor_a.x, anchor_a.y])
                .local_anchor2(point![anchor_b.x, anchor_b.y])
                .build()
                .into(),
        };

        Some(JointHandle(self.physics.impulse_joints.insert(
            body_a, body_b, data, wake_up,
        )))
    }

    pub fn remove_joint(&mut self, handle: JointHandle) {
        self.physics.impulse_joints.remove(handle.0, true);
    }

    pub fn joint_count(&self) -> usize {
        self.physics.impulse_joints.len()
    }

    // ---- drawing & teardown ------------------------------------------

    /// Draws fixtures, joint anchors, and recent queries through the
    /// renderer, modulated by `alpha`. Render state is restored before
    /// returning.
    pub fn draw<R: DebugRenderer>(&mut self, renderer: &mut R, alpha: f32) {
        debug::draw_world(
            &self.physics,
            self.meter,
            &mut self.query_draws,
            renderer,
            alpha,
        );
    }

    /// Consumes the world, destroying every collider and joint. Dropping
    /// the world does the same; this form just makes teardown explicit.
    pub fn destroy(self) {}
}
