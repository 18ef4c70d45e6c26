//! 2D geometry predicates layered on top of `glam`.
//!
//! These back the precise phase of area queries: the broad phase hands over
//! every fixture whose bounding box touches the query region, and these
//! tests decide actual overlap.

use glam::Vec2;

/// Length of the segment from `a` to `b`.
pub fn segment_length(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Area-weighted centroid of a polygon, falling back to the vertex mean for
/// degenerate (zero-area) input.
pub fn polygon_centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    let mut area = 0.0;
    let mut centroid = Vec2::ZERO;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let cross = a.x * b.y - b.x * a.y;
        area += cross;
        centroid += (a + b) * cross;
    }
    if area.abs() < 1e-9 {
        return points.iter().copied().sum::<Vec2>() / points.len() as f32;
    }
    centroid / (3.0 * area)
}

/// Largest distance from `center` to any of `points`.
pub fn bounding_radius(points: &[Vec2], center: Vec2) -> f32 {
    points
        .iter()
        .map(|p| (*p - center).length())
        .fold(0.0, f32::max)
}

/// Whether two discs overlap (touching counts).
pub fn circles_overlap(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    (c2 - c1).length_squared() <= (r1 + r2) * (r1 + r2)
}

/// Even-odd ray-crossing containment test.
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from point `p` to the segment `a`-`b`.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Whether a disc overlaps a polygon: center containment or any edge within
/// the radius. Also true when the polygon sits entirely inside the disc.
pub fn circle_overlaps_polygon(center: Vec2, radius: f32, poly: &[Vec2]) -> bool {
    if poly.is_empty() {
        return false;
    }
    if point_in_polygon(center, poly) {
        return true;
    }
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        if point_segment_distance(center, a, b) <= radius {
            return true;
        }
    }
    false
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) - 1e-9
        && p.x <= a.x.max(b.x) + 1e-9
        && p.y >= a.y.min(b.y) - 1e-9
        && p.y <= a.y.max(b.y) + 1e-9
}

/// Segment-segment intersection, including touching and collinear overlap.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1.abs() < 1e-9 && on_segment(b1, b2, a1))
        || (d2.abs() < 1e-9 && on_segment(b1, b2, a2))
        || (d3.abs() < 1e-9 && on_segment(a1, a2, b1))
        || (d4.abs() < 1e-9 && on_segment(a1, a2, b2))
}

/// Whether two polygons overlap: vertex containment either way or any pair
/// of edges crossing. Open vertex chains degrade gracefully since the test
/// never assumes convexity.
pub fn polygons_overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.iter().any(|p| point_in_polygon(*p, b)) || b.iter().any(|p| point_in_polygon(*p, a)) {
        return true;
    }
    for i in 0..a.len() {
        let a1 = a[i];
        let a2 = a[(i + 1) % a.len()];
        for j in 0..b.len() {
            let b1 = b[j];
            let b2 = b[(j + 1) % b.len()];
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}
