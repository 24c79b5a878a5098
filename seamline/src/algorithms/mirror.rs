//! Reflection of points and figures across axis-aligned lines, and
//! unfolding of half patterns along a fold line.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::FigureGraph;
use crate::ids::IdSource;
use crate::model::{Figure, Tool, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The line `x = position`.
    Vertical,
    /// The line `y = position`.
    Horizontal,
}

pub fn mirror_point(p: Vec2, axis: Axis, position: f64) -> Vec2 {
    match axis {
        Axis::Vertical => Vec2::new(2.0 * position - p.x, p.y),
        Axis::Horizontal => Vec2::new(p.x, 2.0 * position - p.y),
    }
}

/// Reflection through the local origin along the axis direction.
fn flip_local(p: Vec2, axis: Axis) -> Vec2 {
    mirror_point(p, axis, 0.0)
}

/// Reflects a whole figure in world space. Local coordinates are flipped,
/// the origin is mirrored and the rotation negated, which maps every world
/// point `w` to `mirror_point(w)`. Notches swap side since the orientation
/// of every edge is reversed by the reflection.
pub fn mirror_figure(figure: &Figure, axis: Axis, position: f64) -> Figure {
    let mut out = figure.clone();
    let origin = mirror_point(figure.origin(), axis, position);
    out.x = origin.x;
    out.y = origin.y;
    out.rotation = if figure.rotation == 0.0 { 0.0 } else { -figure.rotation };
    for n in out.nodes.iter_mut() {
        let p = flip_local(n.pos(), axis);
        n.x = p.x;
        n.y = p.y;
        n.in_handle = n.in_handle.map(|h| flip_local(h, axis));
        n.out_handle = n.out_handle.map(|h| flip_local(h, axis));
    }
    for seg in out.seam_segments.iter_mut() {
        for p in seg.iter_mut() {
            *p = flip_local(*p, axis);
        }
    }
    for pq in out.piques.iter_mut() {
        pq.side = -pq.side;
    }
    out
}

/// Mirrors an open stroke across the fold line and joins both halves into
/// one closed polyline of twice as many points. Curves degrade to straight
/// segments between their nodes. The figure keeps its id, origin and role.
pub fn unfold_figure(
    figure: &Figure,
    axis: Axis,
    position: f64,
    ids: &mut dyn IdSource,
) -> Option<Figure> {
    if figure.closed {
        debug!(figure = %figure.id, "unfold needs an open figure");
        return None;
    }
    let graph = FigureGraph::new(figure);
    let chains = graph.chains();
    let [chain] = chains.as_slice() else {
        debug!(figure = %figure.id, chains = chains.len(), "unfold needs a single stroke");
        return None;
    };
    let local: Vec<Vec2> = graph
        .chain_nodes(chain)
        .into_iter()
        .filter_map(|id| graph.pos(id))
        .collect();
    if local.len() < 2 {
        return None;
    }
    let world: Vec<Vec2> = local.iter().map(|p| figure.to_world(*p)).collect();
    let mirrored = world
        .iter()
        .rev()
        .map(|w| figure.to_local(mirror_point(*w, axis, position)));
    let points: Vec<Vec2> = local.iter().copied().chain(mirrored).collect();

    let mut out = Figure::from_points(figure.id.clone(), Tool::Polyline, &points, true, ids);
    out.x = figure.x;
    out.y = figure.y;
    out.rotation = figure.rotation;
    out.role = figure.role.clone();
    out.dashed = figure.dashed;
    Some(out)
}
