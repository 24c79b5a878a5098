use crate::graph::{FigureGraph, WalkStep};
use crate::model::Vec2;

use super::tolerance::{EPS_AREA, EPS_POS};

/// Lazily flattens a walk: straight edges contribute their end point, cubic
/// edges their samples. Shared vertices between consecutive steps are emitted once.
pub struct FlattenIter<'g, 'a> {
    graph: &'g FigureGraph<'a>,
    steps: Vec<WalkStep>,
    next_step: usize,
    samples: usize,
    started: bool,
    buf: std::vec::IntoIter<Vec2>,
}

impl<'g, 'a> FlattenIter<'g, 'a> {
    pub fn new(graph: &'g FigureGraph<'a>, steps: Vec<WalkStep>, samples: usize) -> Self {
        FlattenIter {
            graph,
            steps,
            next_step: 0,
            samples,
            started: false,
            buf: Vec::new().into_iter(),
        }
    }
}

impl Iterator for FlattenIter<'_, '_> {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        loop {
            if let Some(p) = self.buf.next() {
                return Some(p);
            }
            let step = *self.steps.get(self.next_step)?;
            self.next_step += 1;
            let Some(geom) = self.graph.step_geom(step) else {
                continue;
            };
            let mut pts = geom.polyline(self.samples);
            if self.started && !pts.is_empty() {
                pts.remove(0);
            }
            self.started = true;
            self.buf = pts.into_iter();
        }
    }
}

/// Signed shoelace area; positive when counter-clockwise in y-up axes.
pub fn polygon_area(poly: &[Vec2]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    for i in 0..n {
        a += poly[i].cross(poly[(i + 1) % n]);
    }
    0.5 * a
}

pub fn mean_point(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    let mut acc = Vec2::ZERO;
    for p in points {
        acc += *p;
    }
    acc * (1.0 / points.len() as f64)
}

pub fn polygon_centroid(poly: &[Vec2]) -> Vec2 {
    let n = poly.len();
    let mut c = Vec2::ZERO;
    let mut a = 0.0;
    for i in 0..n {
        let (p, q) = (poly[i], poly[(i + 1) % n]);
        let cross = p.cross(q);
        a += cross;
        c += (p + q) * cross;
    }
    let a = a * 0.5;
    if a.abs() < EPS_AREA {
        return mean_point(poly);
    }
    c * (1.0 / (6.0 * a))
}

/// Even-odd point-in-polygon test. A repeated closing vertex is harmless.
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Drops consecutive points closer than `EPS_POS`.
pub fn dedupe_consecutive(points: &mut Vec<Vec2>) {
    points.dedup_by(|b, a| a.distance(*b) < EPS_POS);
}
