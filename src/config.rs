//! Crate-wide configuration constants.

/// Default meter scale for games that think in pixels (px per meter).
pub const DEFAULT_METER: f32 = 32.0;

/// Ceiling on distinct collision categories, inherited from the engine's
/// 16-bit narrow-phase filter.
pub const MAX_COLLISION_CATEGORIES: usize = 16;

/// Name of the collision class every world starts with and every collider
/// defaults to.
pub const DEFAULT_CLASS: &str = "Default";

/// How many frames a recorded query shape stays on the debug overlay.
pub const QUERY_DRAW_FRAMES: u32 = 10;

/// Shape name used for the fixture a collider constructor creates.
pub const MAIN_SHAPE: &str = "main";
