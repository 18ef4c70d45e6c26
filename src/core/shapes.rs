//! Tagged shape definitions colliders are built from.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Geometry attached to a collider. Construction and query paths dispatch
/// on the tag; positions are relative to the owning body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeDef {
    Circle {
        radius: f32,
    },
    Rectangle {
        width: f32,
        height: f32,
    },
    /// Rectangle with its corners clipped into an octagon by `cut`.
    BsgRectangle {
        width: f32,
        height: f32,
        cut: f32,
    },
    /// Convex polygon given by its vertices.
    Polygon {
        vertices: Vec<Vec2>,
    },
    Line {
        a: Vec2,
        b: Vec2,
    },
    /// Open or closed chain of edge segments.
    Chain {
        vertices: Vec<Vec2>,
        closed: bool,
    },
}

impl ShapeDef {
    /// Vertices of the corner-cut octagon, centered on the body origin.
    pub(crate) fn octagon(width: f32, height: f32, cut: f32) -> Vec<Vec2> {
        let (hw, hh) = (width / 2.0, height / 2.0);
        vec![
            Vec2::new(-hw + cut, -hh),
            Vec2::new(hw - cut, -hh),
            Vec2::new(hw, -hh + cut),
            Vec2::new(hw, hh - cut),
            Vec2::new(hw - cut, hh),
            Vec2::new(-hw + cut, hh),
            Vec2::new(-hw, hh - cut),
            Vec2::new(-hw, -hh + cut),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octagon_stays_inside_its_rectangle() {
        let verts = ShapeDef::octagon(4.0, 2.0, 0.5);
        assert_eq!(verts.len(), 8);
        for v in &verts {
            assert!(v.x.abs() <= 2.0 + 1e-6);
            assert!(v.y.abs() <= 1.0 + 1e-6);
        }
    }
}
