// Ingestion limits applied when loading project documents

// Document size caps
pub const MAX_FIGURES: usize = 10_000;
pub const MAX_NODES_PER_FIGURE: usize = 20_000;
pub const MAX_EDGES_PER_FIGURE: usize = 20_000;
pub const MAX_SEAM_POINTS_PER_FIGURE: usize = 200_000;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 = 10_000_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool {
    x.is_finite() && (COORD_MIN..=COORD_MAX).contains(&x)
}
