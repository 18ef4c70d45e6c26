//! Class-filtered area and line queries.
//!
//! Every area query runs in two phases: the engine's fixture bounding
//! boxes collect candidates, then the geometry predicates in
//! [`utils::math`](crate::utils::math) decide actual overlap against the
//! query shape. Sensor fixtures never participate; the first passing solid
//! fixture admits its collider.

use glam::Vec2;
use nalgebra::{point, vector};
use rapier2d::parry::bounding_volume::{Aabb, BoundingVolume};
use rapier2d::parry::query::Ray;
use rapier2d::parry::shape::ShapeType;

use crate::core::classes::ClassSet;
use crate::core::collider::Collider;
use crate::utils::arena::{Arena, ColliderId};
use crate::utils::math;
use crate::world::physics::{decode_tag, point_to_glam, PhysicsContext};

/// World-space geometry of one fixture, extracted for the precise phase.
pub(crate) enum FixtureGeometry {
    Circle { center: Vec2, radius: f32 },
    /// Closed outline (rectangle, polygon).
    Polygon(Vec<Vec2>),
    /// Open vertex chain (line and chain fixtures). Chains take part in
    /// the polygon predicates through their vertex list, so edge crossings
    /// and containment are still detected.
    Chain(Vec<Vec2>),
}

impl FixtureGeometry {
    pub(crate) fn extract(collider: &rapier2d::geometry::Collider) -> Option<Self> {
        let iso = collider.position();
        let shape = collider.shape();
        match shape.shape_type() {
            ShapeType::Ball => {
                let ball = shape.as_ball()?;
                Some(FixtureGeometry::Circle {
                    center: point_to_glam(&(iso * point![0.0, 0.0])),
                    radius: ball.radius,
                })
            }
            ShapeType::Cuboid => {
                let cuboid = shape.as_cuboid()?;
                let h = cuboid.half_extents;
                let corners = [
                    point![-h.x, -h.y],
                    point![h.x, -h.y],
                    point![h.x, h.y],
                    point![-h.x, h.y],
                ];
                Some(FixtureGeometry::Polygon(
                    corners.iter().map(|p| point_to_glam(&(iso * p))).collect(),
                ))
            }
            ShapeType::ConvexPolygon => {
                let polygon = shape.as_convex_polygon()?;
                Some(FixtureGeometry::Polygon(
                    polygon.points().iter().map(|p| point_to_glam(&(iso * p))).collect(),
                ))
            }
            ShapeType::Segment => {
                let segment = shape.as_segment()?;
                Some(FixtureGeometry::Chain(vec![
                    point_to_glam(&(iso * segment.a)),
                    point_to_glam(&(iso * segment.b)),
                ]))
            }
            ShapeType::Polyline => {
                let polyline = shape.as_polyline()?;
                Some(FixtureGeometry::Chain(
                    polyline.vertices().iter().map(|p| point_to_glam(&(iso * p))).collect(),
                ))
            }
            _ => None,
        }
    }
}

fn class_passes(filter: Option<&ClassSet>, class: &str) -> bool {
    filter.map_or(true, |f| f.contains(class))
}

/// Broad phase + precise phase walk shared by the area queries. `test`
/// receives each candidate fixture's world geometry.
fn collect<F>(
    physics: &PhysicsContext,
    facade: &Arena<Collider>,
    aabb: &Aabb,
    filter: Option<&ClassSet>,
    mut test: F,
) -> Vec<ColliderId>
where
    F: FnMut(&FixtureGeometry) -> bool,
{
    let mut admitted = Vec::new();
    for (_, collider) in physics.colliders.iter() {
        if collider.is_sensor() {
            continue;
        }
        if !collider.compute_aabb().intersects(aabb) {
            continue;
        }
        let Some((owner, _)) = decode_tag(collider.user_data) else {
            continue;
        };
        if admitted.contains(&owner) {
            continue;
        }
        let Some(owner_collider) = facade.get(owner) else {
            continue;
        };
        if !class_passes(filter, owner_collider.collision_class()) {
            continue;
        }
        let Some(geometry) = FixtureGeometry::extract(collider) else {
            continue;
        };
        if test(&geometry) {
            admitted.push(owner);
        }
    }
    admitted
}

/// Colliders with a solid fixture overlapping the disc.
pub(crate) fn query_circle(
    physics: &PhysicsContext,
    facade: &Arena<Collider>,
    center: Vec2,
    radius: f32,
    filter: Option<&ClassSet>,
) -> Vec<ColliderId> {
    let aabb = Aabb::new(
        point![center.x - radius, center.y - radius],
        point![center.x + radius, center.y + radius],
    );
    collect(physics, facade, &aabb, filter, |geometry| match geometry {
        FixtureGeometry::Circle { center: c, radius: r } => {
            math::circles_overlap(center, radius, *c, *r)
        }
        FixtureGeometry::Polygon(vertices) | FixtureGeometry::Chain(vertices) => {
            math::circle_overlaps_polygon(center, radius, vertices)
        }
    })
}

/// Colliders with a solid fixture overlapping the axis-aligned rectangle
/// whose min corner is `(x, y)`.
pub(crate) fn query_rectangle(
    physics: &PhysicsContext,
    facade: &Arena<Collider>,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    filter: Option<&ClassSet>,
) -> Vec<ColliderId> {
    let aabb = Aabb::new(point![x, y], point![x + width, y + height]);
    let rectangle = [
        Vec2::new(x, y),
        Vec2::new(x + width, y),
        Vec2::new(x + width, y + height),
        Vec2::new(x, y + height),
    ];
    collect(physics, facade, &aabb, filter, |geometry| match geometry {
        FixtureGeometry::Circle { center, radius } => {
            math::circle_overlaps_polygon(*center, *radius, &rectangle)
        }
        FixtureGeometry::Polygon(vertices) | FixtureGeometry::Chain(vertices) => {
            math::polygons_overlap(vertices, &rectangle)
        }
    })
}

/// Colliders with a solid fixture overlapping the polygon. The broad phase
/// encloses the polygon's bounding circle in a square.
pub(crate) fn query_polygon(
    physics: &PhysicsContext,
    facade: &Arena<Collider>,
    vertices: &[Vec2],
    filter: Option<&ClassSet>,
) -> Vec<ColliderId> {
    if vertices.len() < 3 {
        return Vec::new();
    }
    let centroid = math::polygon_centroid(vertices);
    let radius = math::bounding_radius(vertices, centroid);
    let aabb = Aabb::new(
        point![centroid.x - radius, centroid.y - radius],
        point![centroid.x + radius, centroid.y + radius],
    );
    collect(physics, facade, &aabb, filter, |geometry| match geometry {
        FixtureGeometry::Circle { center, radius } => {
            math::circle_overlaps_polygon(*center, *radius, vertices)
        }
        FixtureGeometry::Polygon(fixture) | FixtureGeometry::Chain(fixture) => {
            math::polygons_overlap(fixture, vertices)
        }
    })
}

/// Colliders whose solid fixtures intersect the segment, ordered by
/// distance along it.
pub(crate) fn query_line(
    physics: &PhysicsContext,
    facade: &Arena<Collider>,
    a: Vec2,
    b: Vec2,
    filter: Option<&ClassSet>,
) -> Vec<ColliderId> {
    let length = math::segment_length(a, b);
    if length < 1e-9 {
        return Vec::new();
    }
    let direction = (b - a) / length;
    let ray = Ray::new(point![a.x, a.y], vector![direction.x, direction.y]);

    let mut hits: Vec<(ColliderId, f32)> = Vec::new();
    for (_, collider) in physics.colliders.iter() {
        if collider.is_sensor() {
            continue;
        }
        let Some((owner, _)) = decode_tag(collider.user_data) else {
            continue;
        };
        let Some(owner_collider) = facade.get(owner) else {
            continue;
        };
        if !class_passes(filter, owner_collider.collision_class()) {
            continue;
        }
        let Some(toi) = collider.shape().cast_ray(collider.position(), &ray, length, true) else {
            continue;
        };
        match hits.iter_mut().find(|(id, _)| *id == owner) {
            Some(hit) => hit.1 = hit.1.min(toi),
            None => hits.push((owner, toi)),
        }
    }
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    hits.into_iter().map(|(id, _)| id).collect()
}
