//! Error types for world and collision-class operations.
//!
//! Only hard misuse errors live here. Soft conditions (polling a peer class
//! that never registered, stale collider ids, empty event queues) return
//! `false`/`None`/empty instead of failing.

use thiserror::Error;

/// Errors surfaced by [`CollisionWorld`](crate::CollisionWorld) operations.
#[derive(Debug, Error)]
pub enum StrataError {
    /// A collision class with this name is already registered.
    #[error("collision class already registered: {0}")]
    DuplicateClass(String),
    /// The named collision class was never registered.
    #[error("unknown collision class: {0}")]
    UnknownClass(String),
    /// The collider already carries a shape with this name.
    #[error("shape name already used on this collider: {0}")]
    DuplicateShape(String),
    /// The ignore graph demands more distinct categories than the engine's
    /// 16-bit filter can represent.
    #[error("ignore graph exceeds the 16 collision categories the engine supports (classes: {classes:?})")]
    CategoryOverflow { classes: Vec<String> },
    /// Explicit collision events must be chosen before any class or
    /// collider exists.
    #[error("explicit collision events must be configured before classes or colliders are created")]
    ExplicitEventsLocked,
    /// The shape definition cannot be turned into an engine fixture.
    #[error("degenerate shape: {0}")]
    InvalidShape(String),
}

/// Convenient Result type alias for world operations.
pub type Result<T> = std::result::Result<T, StrataError>;
