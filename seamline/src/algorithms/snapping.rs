//! Snap candidates (endpoints, edge midpoints, cross-figure intersections)
//! in world coordinates, and nearest-candidate lookup.

use serde::{Deserialize, Serialize};

use crate::geometry::intersect::intersect_segments;
use crate::graph::FigureGraph;
use crate::model::{EdgeId, Figure, FigureId, NodeId, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapKind {
    Endpoint,
    Midpoint,
    Intersection,
}

/// A snap candidate and where it came from. `t` is the curve parameter on
/// `edge_id`; intersections also name the edge of the second figure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapPoint {
    pub pos: Vec2,
    pub kind: SnapKind,
    pub figure_id: FigureId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<EdgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_figure_id: Option<FigureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_edge_id: Option<EdgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_t: Option<f64>,
}

impl SnapPoint {
    fn new(pos: Vec2, kind: SnapKind, figure_id: &str) -> Self {
        SnapPoint {
            pos,
            kind,
            figure_id: figure_id.to_string(),
            node_id: None,
            edge_id: None,
            t: None,
            other_figure_id: None,
            other_edge_id: None,
            other_t: None,
        }
    }
}

/// One flattened edge in world space.
struct WorldEdge<'a> {
    figure: &'a str,
    edge: &'a str,
    points: Vec<Vec2>,
    min: Vec2,
    max: Vec2,
}

impl WorldEdge<'_> {
    fn overlaps(&self, o: &WorldEdge) -> bool {
        self.min.x <= o.max.x && o.min.x <= self.max.x && self.min.y <= o.max.y && o.min.y <= self.max.y
    }
    /// Polyline segment index plus local parameter -> curve parameter. Edge
    /// polylines are sampled uniformly in the curve parameter.
    fn curve_t(&self, segment: usize, local: f64) -> f64 {
        let n = (self.points.len() - 1).max(1) as f64;
        (segment as f64 + local) / n
    }
}

fn world_edges<'a>(fig: &'a Figure, samples: usize) -> Vec<WorldEdge<'a>> {
    let graph = FigureGraph::new(fig);
    graph
        .valid_edges()
        .filter_map(|idx| {
            let e = graph.edge(idx)?;
            let points: Vec<Vec2> = graph
                .edge_geom(idx)?
                .polyline(samples)
                .into_iter()
                .map(|p| fig.to_world(p))
                .collect();
            let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
            let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
            for p in &points {
                min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
                max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
            }
            Some(WorldEdge {
                figure: &fig.id,
                edge: &e.id,
                points,
                min,
                max,
            })
        })
        .collect()
}

/// Every snap candidate of `figures`, skipping the figure named by
/// `exclude` (usually the one being drawn or dragged). Order: endpoints and
/// midpoints figure by figure, then intersections.
pub fn get_all_snap_points(figures: &[Figure], exclude: Option<&str>, samples: usize) -> Vec<SnapPoint> {
    let included: Vec<&Figure> = figures
        .iter()
        .filter(|f| exclude != Some(f.id.as_str()))
        .collect();
    let mut out = Vec::new();
    for fig in &included {
        for n in &fig.nodes {
            let mut sp = SnapPoint::new(fig.to_world(n.pos()), SnapKind::Endpoint, &fig.id);
            sp.node_id = Some(n.id.clone());
            out.push(sp);
        }
        let graph = FigureGraph::new(fig);
        for idx in graph.valid_edges() {
            let (Some(e), Some(geom)) = (graph.edge(idx), graph.edge_geom(idx)) else {
                continue;
            };
            let mut sp = SnapPoint::new(fig.to_world(geom.midpoint()), SnapKind::Midpoint, &fig.id);
            sp.edge_id = Some(e.id.clone());
            sp.t = Some(0.5);
            out.push(sp);
        }
    }

    let edges: Vec<Vec<WorldEdge>> = included.iter().map(|f| world_edges(f, samples)).collect();
    for (i, a_edges) in edges.iter().enumerate() {
        for b_edges in &edges[i + 1..] {
            for a in a_edges {
                for b in b_edges.iter().filter(|b| a.overlaps(b)) {
                    push_intersections(a, b, &mut out);
                }
            }
        }
    }
    out
}

fn push_intersections(a: &WorldEdge, b: &WorldEdge, out: &mut Vec<SnapPoint>) {
    for (i, sa) in a.points.windows(2).enumerate() {
        for (j, sb) in b.points.windows(2).enumerate() {
            let Some(hit) = intersect_segments(sa[0], sa[1], sb[0], sb[1]) else {
                continue;
            };
            let mut sp = SnapPoint::new(hit.point, SnapKind::Intersection, a.figure);
            sp.edge_id = Some(a.edge.to_string());
            sp.t = Some(a.curve_t(i, hit.t));
            sp.other_figure_id = Some(b.figure.to_string());
            sp.other_edge_id = Some(b.edge.to_string());
            sp.other_t = Some(b.curve_t(j, hit.u));
            out.push(sp);
        }
    }
}

/// Closest candidate strictly within `threshold` of `pos`; the first one
/// wins on exact ties.
pub fn find_nearest_snap_point<'s>(pos: Vec2, points: &'s [SnapPoint], threshold: f64) -> Option<&'s SnapPoint> {
    let mut best: Option<(&SnapPoint, f64)> = None;
    for sp in points {
        let d = pos.distance(sp.pos);
        if !(d < threshold) {
            continue;
        }
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((sp, d));
        }
    }
    best.map(|(sp, _)| sp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::model::Tool;

    fn line(id: &str, a: Vec2, b: Vec2, ids: &mut SequentialIds) -> Figure {
        Figure::from_points(id, Tool::Line, &[a, b], false, ids)
    }

    #[test]
    fn endpoints_midpoints_and_crossings() {
        let mut ids = SequentialIds::new();
        let figs = vec![
            line("h", Vec2::new(0.0, 50.0), Vec2::new(100.0, 50.0), &mut ids),
            line("v", Vec2::new(40.0, 0.0), Vec2::new(40.0, 100.0), &mut ids),
        ];
        let pts = get_all_snap_points(&figs, None, 16);
        let count = |k| pts.iter().filter(|p| p.kind == k).count();
        assert_eq!(count(SnapKind::Endpoint), 4);
        assert_eq!(count(SnapKind::Midpoint), 2);
        assert_eq!(count(SnapKind::Intersection), 1);
        let x = pts.iter().find(|p| p.kind == SnapKind::Intersection).unwrap();
        assert!(x.pos.distance(Vec2::new(40.0, 50.0)) < 1e-9);
        assert!((x.t.unwrap() - 0.4).abs() < 1e-9);
        assert!((x.other_t.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(x.other_figure_id.as_deref(), Some("v"));
    }

    #[test]
    fn no_self_intersections_and_exclusion() {
        let mut ids = SequentialIds::new();
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(0.0, 100.0),
        ];
        let zig = Figure::from_points("z", Tool::Polyline, &pts, false, &mut ids);
        let other = line("o", Vec2::new(-10.0, 50.0), Vec2::new(-10.0, 60.0), &mut ids);
        let figs = vec![zig, other];
        let all = get_all_snap_points(&figs, None, 16);
        assert!(all.iter().all(|p| p.kind != SnapKind::Intersection));
        let without = get_all_snap_points(&figs, Some("z"), 16);
        assert!(without.iter().all(|p| p.figure_id == "o"));
    }

    #[test]
    fn nearest_respects_threshold_and_ties() {
        let a = SnapPoint::new(Vec2::new(0.0, 0.0), SnapKind::Endpoint, "a");
        let b = SnapPoint::new(Vec2::new(10.0, 0.0), SnapKind::Endpoint, "b");
        let pts = vec![a, b];
        assert!(find_nearest_snap_point(Vec2::new(5.0, 20.0), &pts, 10.0).is_none());
        let hit = find_nearest_snap_point(Vec2::new(5.0, 0.0), &pts, 10.0).unwrap();
        assert_eq!(hit.figure_id, "a");
        let exact = find_nearest_snap_point(Vec2::new(10.0, 0.0), &pts, 10.0).unwrap();
        assert_eq!(exact.figure_id, "b");
        assert!(find_nearest_snap_point(Vec2::new(20.0, 0.0), &pts, 10.0).is_none());
    }
}
