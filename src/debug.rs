//! Debug-draw overlay: fixtures, joint anchors, and recent queries.

use glam::Vec2;

use crate::collision::queries::FixtureGeometry;
use crate::world::physics::{point_to_glam, PhysicsContext};

/// Outline or filled rendering of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Line,
    Fill,
}

/// Immediate-mode rendering collaborator the overlay draws through.
///
/// Color and line width are read before drawing and restored afterwards,
/// so the overlay never leaks render state into the caller. Concave
/// polygons may be handed to [`Self::polygon`] in fill mode; the renderer
/// is expected to triangulate.
pub trait DebugRenderer {
    fn color(&self) -> [f32; 4];
    fn set_color(&mut self, rgba: [f32; 4]);
    fn line_width(&self) -> f32;
    fn set_line_width(&mut self, width: f32);
    fn polygon(&mut self, mode: DrawMode, points: &[Vec2]);
    fn line(&mut self, a: Vec2, b: Vec2);
    fn circle(&mut self, mode: DrawMode, center: Vec2, radius: f32);
    fn rectangle(&mut self, mode: DrawMode, position: Vec2, size: Vec2);
}

/// One recorded query, redrawn for a few frames.
#[derive(Debug, Clone)]
pub(crate) struct QueryDraw {
    pub shape: QueryShape,
    pub frames: u32,
}

#[derive(Debug, Clone)]
pub(crate) enum QueryShape {
    Circle { center: Vec2, radius: f32 },
    Rectangle { position: Vec2, size: Vec2 },
    Polygon { vertices: Vec<Vec2> },
    Line { a: Vec2, b: Vec2 },
}

const FIXTURE_COLOR: [f32; 3] = [0.87, 0.87, 0.87];
const JOINT_COLOR: [f32; 3] = [0.87, 0.5, 0.25];
const QUERY_COLOR: [f32; 3] = [0.25, 0.5, 0.87];

fn with_alpha(rgb: [f32; 3], alpha: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], alpha]
}

pub(crate) fn draw_world(
    physics: &PhysicsContext,
    meter: f32,
    query_draws: &mut Vec<QueryDraw>,
    renderer: &mut dyn DebugRenderer,
    alpha: f32,
) {
    let saved_color = renderer.color();
    let saved_width = renderer.line_width();
    renderer.set_line_width(1.0);

    renderer.set_color(with_alpha(FIXTURE_COLOR, alpha));
    for (_, collider) in physics.colliders.iter() {
        if collider.is_sensor() {
            continue;
        }
        match FixtureGeometry::extract(collider) {
            Some(FixtureGeometry::Circle { center, radius }) => {
                renderer.circle(DrawMode::Line, center, radius);
            }
            Some(FixtureGeometry::Polygon(vertices)) => {
                renderer.polygon(DrawMode::Line, &vertices);
            }
            Some(FixtureGeometry::Chain(vertices)) => {
                for pair in vertices.windows(2) {
                    renderer.line(pair[0], pair[1]);
                }
            }
            None => {}
        }
    }

    renderer.set_color(with_alpha(JOINT_COLOR, alpha));
    let anchor_radius = meter / 8.0;
    for (_, joint) in physics.impulse_joints.iter() {
        let Some(body1) = physics.bodies.get(joint.body1) else {
            continue;
        };
        let Some(body2) = physics.bodies.get(joint.body2) else {
            continue;
        };
        let anchor1 = point_to_glam(&(body1.position() * joint.data.local_anchor1()));
        let anchor2 = point_to_glam(&(body2.position() * joint.data.local_anchor2()));
        renderer.circle(DrawMode::Line, anchor1, anchor_radius);
        renderer.circle(DrawMode::Line, anchor2, anchor_radius);
        renderer.line(anchor1, anchor2);
    }

    renderer.set_color(with_alpha(QUERY_COLOR, alpha));
    query_draws.retain_mut(|draw| {
        match &draw.shape {
            QueryShape::Circle { center, radius } => {
                renderer.circle(DrawMode::Fill, *center, *radius);
            }
            QueryShape::Rectangle { position, size } => {
                renderer.rectangle(DrawMode::Fill, *position, *size);
            }
            QueryShape::Polygon { vertices } => {
                renderer.polygon(DrawMode::Fill, vertices);
            }
            QueryShape::Line { a, b } => {
                renderer.line(*a, *b);
            }
        }
        draw.frames -= 1;
        draw.frames > 0
    });

    renderer.set_color(saved_color);
    renderer.set_line_width(saved_width);
}
