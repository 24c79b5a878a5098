use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use super::tolerance::{clamp01, EPS_LEN};
use crate::model::Vec2;

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }
    #[inline]
    pub fn dot(self, o: Vec2) -> f64 {
        self.x * o.x + self.y * o.y
    }
    /// z component of the 3D cross product.
    #[inline]
    pub fn cross(self, o: Vec2) -> f64 {
        self.x * o.y - self.y * o.x
    }
    #[inline]
    pub fn length_sq(self) -> f64 {
        self.dot(self)
    }
    #[inline]
    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }
    #[inline]
    pub fn distance(self, o: Vec2) -> f64 {
        (self - o).length()
    }
    /// Unit vector, or the zero vector when shorter than `EPS_LEN`.
    #[inline]
    pub fn normalize(self) -> Vec2 {
        let len = self.length();
        if len < EPS_LEN || !len.is_finite() {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }
    /// Rotated +90 degrees: (x, y) -> (-y, x).
    #[inline]
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }
    #[inline]
    pub fn lerp(self, o: Vec2, t: f64) -> Vec2 {
        Vec2::new(self.x + (o.x - self.x) * t, self.y + (o.y - self.y) * t)
    }
    #[inline]
    pub fn midpoint(self, o: Vec2) -> Vec2 {
        self.lerp(o, 0.5)
    }
    pub fn rotate_deg(self, deg: f64) -> Vec2 {
        if deg == 0.0 || !deg.is_finite() {
            return self;
        }
        let (s, c) = deg.to_radians().sin_cos();
        Vec2::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
    #[inline]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}
impl AddAssign for Vec2 {
    fn add_assign(&mut self, o: Vec2) {
        self.x += o.x;
        self.y += o.y;
    }
}
impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }
}
impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f64) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}
impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Squared distance from `p` to segment `ab` and the clamped parameter of the projection.
pub fn seg_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> (f64, f64) {
    let v = b - a;
    let vv = v.length_sq();
    let t = if vv > EPS_LEN * EPS_LEN {
        clamp01((p - a).dot(v) / vv)
    } else {
        0.0
    };
    let proj = a + v * t;
    ((p - proj).length_sq(), t)
}

pub fn dist_point_to_seg(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    seg_distance_sq(p, a, b).0.sqrt()
}

/// Signed angle difference folded into (-pi, pi].
pub fn normalize_angle(mut a: f64) -> f64 {
    if !a.is_finite() {
        return 0.0;
    }
    let two_pi = std::f64::consts::TAU;
    a %= two_pi;
    if a <= -std::f64::consts::PI {
        a += two_pi;
    } else if a > std::f64::consts::PI {
        a -= two_pi;
    }
    a
}

/// Fold a label rotation (degrees) into (-90, 90] so text never reads upside down.
pub fn upright_label_angle(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let mut a = deg % 360.0;
    if a <= -180.0 {
        a += 360.0;
    } else if a > 180.0 {
        a -= 360.0;
    }
    if a > 90.0 {
        a -= 180.0;
    } else if a <= -90.0 {
        a += 180.0;
    }
    a
}
