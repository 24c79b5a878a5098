// Centralized tolerances and helpers for robust geometry

pub const EPS_LEN: f64 = 1e-9; // zero-length vector threshold
pub const EPS_POS: f64 = 1e-4; // point coincidence / degenerate edge threshold (px)
pub const EPS_DENOM: f64 = 1e-12; // denominator guard for determinants and ratios
pub const EPS_ANG: f64 = 1e-9; // angle compare slack (radians)
pub const EPS_AREA: f64 = 1e-6; // degenerate polygon area (px^2)

#[inline]
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}
#[inline]
pub fn near_zero(x: f64, eps: f64) -> bool {
    x.abs() <= eps
}
#[inline]
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[inline]
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() <= EPS_DENOM || !den.is_finite() {
        fallback
    } else {
        num / den
    }
}
