//! strata2d — collision classes on top of rapier2d.
//!
//! Games declare named collision classes with symbolic ignore rules
//! (`All`, all-except, explicit lists); the world compiles those into the
//! engine's category/mask filter, routes the engine's raw callbacks into
//! typed per-collider event queues (`enter`/`exit`/`stay` polling plus
//! synchronous pre/post-solve hooks), and answers class-filtered circle,
//! rectangle, polygon, and line queries.
//!
//! ```no_run
//! use strata2d::{ClassSet, ColliderSettings, CollisionClassDef, CollisionWorld};
//!
//! let mut world = CollisionWorld::new(0.0, 512.0, true);
//! world
//!     .add_collision_class(
//!         "Ghost",
//!         CollisionClassDef::new().with_ignores(ClassSet::named(["Wall"])),
//!     )
//!     .unwrap();
//! world.add_collision_class("Wall", CollisionClassDef::new()).unwrap();
//!
//! let ghost = world
//!     .new_circle_collider(40.0, 0.0, 8.0, &ColliderSettings::of_class("Ghost"))
//!     .unwrap();
//! world
//!     .new_rectangle_collider(0.0, 60.0, 200.0, 20.0, &ColliderSettings::static_body())
//!     .unwrap();
//!
//! loop {
//!     world.update(1.0 / 60.0);
//!     if let Some(ghost) = world.collider_mut(ghost) {
//!         // the ghost passes through walls but still reports the overlap
//!         if ghost.enter("Wall") {
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod collision;
pub mod config;
pub mod core;
pub mod debug;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::Vec2;
// Re-export the engine so games can use its body/joint API without a
// separate dependency.
pub use rapier2d;

pub use crate::collision::routing::Transition;
pub use crate::core::classes::{CategoryMask, ClassSet, CollisionClassDef};
pub use crate::core::collider::{Collider, CollisionData, CollisionKind};
pub use crate::core::contact::ContactSnapshot;
pub use crate::core::shapes::ShapeDef;
pub use crate::debug::{DebugRenderer, DrawMode};
pub use crate::error::{Result, StrataError};
pub use crate::utils::arena::ColliderId;
pub use crate::world::{BodyType, ColliderSettings, CollisionWorld, JointDef, JointHandle};
