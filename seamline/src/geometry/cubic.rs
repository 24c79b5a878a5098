//! Cubic Bézier evaluation, subdivision and fixed-step sampling.

use crate::model::Vec2;

/// Control points of a cubic Bézier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec2, // Start point
    pub p1: Vec2, // First control point
    pub p2: Vec2, // Second control point
    pub p3: Vec2, // End point
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Evaluate the curve at parameter t ∈ [0, 1] (Bernstein form).
    pub fn eval(&self, t: f64) -> Vec2 {
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let t2 = t * t;
        let a = mt2 * mt;
        let b = 3.0 * mt2 * t;
        let c = 3.0 * mt * t2;
        let d = t2 * t;
        Vec2 {
            x: a * self.p0.x + b * self.p1.x + c * self.p2.x + d * self.p3.x,
            y: a * self.p0.y + b * self.p1.y + c * self.p2.y + d * self.p3.y,
        }
    }

    /// Derivative at parameter t.
    pub fn tangent(&self, t: f64) -> Vec2 {
        let mt = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * mt * mt)
            + (self.p2 - self.p1) * (6.0 * mt * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Unit direction of travel at t. Falls back to neighbouring control
    /// points, then the chord, when the derivative vanishes (coincident handles).
    pub fn direction(&self, t: f64) -> Vec2 {
        let d = self.tangent(t).normalize();
        if d != Vec2::ZERO {
            return d;
        }
        let fallback = if t < 0.5 {
            self.p2 - self.p0
        } else {
            self.p3 - self.p1
        }
        .normalize();
        if fallback != Vec2::ZERO {
            return fallback;
        }
        (self.p3 - self.p0).normalize()
    }

    /// Split the curve at parameter t using de Casteljau subdivision.
    pub fn split_at(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);
        (
            CubicBezier::new(self.p0, p01, p012, mid),
            CubicBezier::new(mid, p123, p23, self.p3),
        )
    }

    /// Portion of the curve between t0 and t1.
    pub fn subcurve(&self, t0: f64, t1: f64) -> CubicBezier {
        if t0 >= t1 {
            let p = self.eval(t0);
            return CubicBezier::new(p, p, p, p);
        }
        let (head, _) = self.split_at(t1);
        let rel = if t1 > 0.0 { t0 / t1 } else { 0.0 };
        head.split_at(rel).1
    }

    /// `steps + 1` points at uniform parameter spacing, endpoints included.
    pub fn sample(&self, steps: usize) -> Vec<Vec2> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.eval(i as f64 / steps as f64))
            .collect()
    }

    pub fn approx_length(&self, steps: usize) -> f64 {
        super::path_length::polyline_length(&self.sample(steps))
    }

    /// Parameter whose arc length from the start is closest to `target`,
    /// found on a uniform sampling refined by linear interpolation.
    pub fn parameter_at_length(&self, target: f64, steps: usize) -> f64 {
        let steps = steps.max(1);
        let pts = self.sample(steps);
        let mut acc = 0.0;
        for i in 0..steps {
            let seg = pts[i].distance(pts[i + 1]);
            if acc + seg >= target {
                let local = if seg > 0.0 { (target - acc) / seg } else { 0.0 };
                return ((i as f64 + local.clamp(0.0, 1.0)) / steps as f64).clamp(0.0, 1.0);
            }
            acc += seg;
        }
        1.0
    }
}
