//! Polyline length and arc-length lookups.

use crate::model::Vec2;

/// A point on a polyline together with its unit tangent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub pos: Vec2,
    pub tangent: Vec2,
    /// Index of the segment the point lies on.
    pub segment: usize,
}

pub fn polyline_length(points: &[Vec2]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Point at arc-length `distance` from the start. Distances outside
/// [0, length] clamp to the ends. Zero-length segments are skipped when
/// choosing the tangent.
pub fn point_at_distance(points: &[Vec2], distance: f64) -> Option<PathPoint> {
    if points.len() < 2 {
        return None;
    }
    let total = polyline_length(points);
    if total <= 0.0 {
        return None;
    }
    let target = if distance.is_finite() {
        distance.clamp(0.0, total)
    } else {
        0.0
    };
    let mut acc = 0.0;
    let mut last_nonzero = None;
    for i in 0..points.len() - 1 {
        let (a, b) = (points[i], points[i + 1]);
        let seg = a.distance(b);
        if seg <= 0.0 {
            continue;
        }
        last_nonzero = Some(i);
        if acc + seg >= target {
            let t = (target - acc) / seg;
            return Some(PathPoint {
                pos: a.lerp(b, t),
                tangent: (b - a).normalize(),
                segment: i,
            });
        }
        acc += seg;
    }
    last_nonzero.map(|i| PathPoint {
        pos: points[i + 1],
        tangent: (points[i + 1] - points[i]).normalize(),
        segment: i,
    })
}

/// Point at fraction `ratio` ∈ [0, 1] of the total arc length.
pub fn point_at_ratio(points: &[Vec2], ratio: f64) -> Option<PathPoint> {
    let total = polyline_length(points);
    point_at_distance(points, total * super::tolerance::clamp01(ratio))
}
