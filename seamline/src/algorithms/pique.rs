//! Piques: short alignment notches placed along an edge.

use tracing::debug;

use crate::graph::FigureGraph;
use crate::model::{Figure, Pique, Vec2};

/// Appends a notch at arc-length fraction `t01` of `edge_id`. `None` when the
/// edge is unknown or the parameters are unusable.
pub fn add_pique(figure: &Figure, edge_id: &str, t01: f64, length_cm: f64, side: i8) -> Option<Figure> {
    figure.edge(edge_id)?;
    if !t01.is_finite() || !length_cm.is_finite() || length_cm <= 0.0 || !matches!(side, 1 | -1) {
        debug!(figure = %figure.id, edge = edge_id, t01, length_cm, side, "pique rejected");
        return None;
    }
    let mut out = figure.clone();
    out.piques.push(Pique {
        edge_id: edge_id.to_string(),
        t01: t01.clamp(0.0, 1.0),
        length_cm,
        side,
    });
    Some(out)
}

/// The notch tick in local coordinates: from the edge point at `t01` along
/// the edge's left normal, flipped when `side` is -1.
pub fn pique_segment(figure: &Figure, pique: &Pique, px_per_cm: f64, samples: usize) -> Option<(Vec2, Vec2)> {
    let graph = FigureGraph::new(figure);
    let geom = graph.edge_geom(graph.edge_index(&pique.edge_id)?)?;
    if geom.is_degenerate() {
        return None;
    }
    let at = geom.point_at_ratio(pique.t01, samples)?;
    let normal = at.tangent.perp() * f64::from(pique.side);
    Some((at.pos, at.pos + normal * (pique.length_cm * px_per_cm)))
}
