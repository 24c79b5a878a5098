// Segment-segment intersection via the parametric 2x2 solution.

use super::tolerance::{EPS_DENOM, EPS_POS};
use crate::model::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegHit {
    /// Parameter along the first segment.
    pub t: f64,
    /// Parameter along the second segment.
    pub u: f64,
    pub point: Vec2,
}

/// Intersection of segments `ab` and `cd`. Accepted only when both parameters
/// lie in [0, 1]; parallel and coincident segments yield `None`.
pub fn intersect_segments(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> Option<SegHit> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() <= EPS_DENOM * (1.0 + r.length_sq() * s.length_sq()) {
        return None;
    }
    let qp = c - a;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(SegHit {
        t,
        u,
        point: a + r * t,
    })
}

/// Intersection of the infinite lines through `ab` and `cd`.
pub fn intersect_lines(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> Option<Vec2> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() <= EPS_DENOM * (1.0 + r.length_sq() * s.length_sq()) {
        return None;
    }
    let t = (c - a).cross(s) / denom;
    let p = a + r * t;
    p.is_finite().then_some(p)
}

/// True when the segments cross at a point interior to both (endpoint
/// touches within `EPS_POS` of arc length do not count).
pub fn segments_cross(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let Some(hit) = intersect_segments(a, b, c, d) else {
        return false;
    };
    let la = a.distance(b);
    let lc = c.distance(d);
    let interior = |t: f64, len: f64| t * len > EPS_POS && (1.0 - t) * len > EPS_POS;
    interior(hit.t, la) && interior(hit.u, lc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn proper_cross() {
        let hit = intersect_segments(v(0.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(2.0, 0.0)).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-12 && (hit.u - 0.5).abs() < 1e-12);
        assert_eq!(hit.point, v(1.0, 1.0));
        assert!(segments_cross(v(0.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(2.0, 0.0)));
    }

    #[test]
    fn endpoint_touch_is_hit_but_not_cross() {
        let hit = intersect_segments(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-12 && hit.u.abs() < 1e-12);
        assert!(!segments_cross(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)));
    }

    #[test]
    fn parallel_and_collinear_yield_none() {
        assert!(intersect_segments(v(0.0, 0.0), v(3.0, 0.0), v(0.0, 1.0), v(3.0, 1.0)).is_none());
        assert!(intersect_segments(v(0.0, 0.0), v(3.0, 0.0), v(1.0, 0.0), v(2.0, 0.0)).is_none());
    }

    #[test]
    fn out_of_range_parameters_rejected() {
        assert!(intersect_segments(v(0.0, 0.0), v(1.0, 0.0), v(2.0, -1.0), v(2.0, 1.0)).is_none());
        assert_eq!(
            intersect_lines(v(0.0, 0.0), v(1.0, 0.0), v(2.0, -1.0), v(2.0, 1.0)),
            Some(v(2.0, 0.0))
        );
    }
}
