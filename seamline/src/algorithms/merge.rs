//! Edge splitting and magnet join: merging a dragged figure into the figure
//! it was snapped onto, sharing one node.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::algorithms::snapping::{SnapKind, SnapPoint};
use crate::geometry::tolerance::{EPS_DENOM, EPS_POS};
use crate::graph::{EdgeGeom, FigureGraph};
use crate::ids::IdSource;
use crate::model::{Edge, Figure, Node, NodeId, NodeMode, Pique, Vec2};

/// Splits edge `edge_id` at curve parameter `t`. The original edge keeps its
/// id and ends at the new node; a new edge runs from the new node to the old
/// end. Returns the updated figure and the id of the node at the split.
/// Parameters that land on an endpoint reuse that endpoint instead of
/// creating a coincident node.
pub fn split_edge_at(
    figure: &Figure,
    edge_id: &str,
    t: f64,
    samples: usize,
    ids: &mut dyn IdSource,
) -> Option<(Figure, NodeId)> {
    if !t.is_finite() {
        return None;
    }
    let graph = FigureGraph::new(figure);
    let idx = graph.edge_index(edge_id)?;
    let edge = graph.edge(idx)?.clone();
    let geom = graph.edge_geom(idx)?;
    let at = geom.eval(t.clamp(0.0, 1.0));
    if at.distance(geom.start()) < EPS_POS {
        return Some((figure.clone(), edge.from));
    }
    if at.distance(geom.end()) < EPS_POS {
        return Some((figure.clone(), edge.to));
    }

    let mut out = figure.clone();
    let node_id = ids.next_id("n");
    let mut node = Node::new(node_id.clone(), at.x, at.y);
    let head_len;
    let tail_len;
    match geom {
        EdgeGeom::Line { a, b } => {
            head_len = a.distance(at);
            tail_len = at.distance(b);
        }
        EdgeGeom::Cubic(c) => {
            let (head, tail) = c.split_at(t);
            head_len = head.approx_length(samples);
            tail_len = tail.approx_length(samples);
            node.mode = NodeMode::Smooth;
            node.in_handle = Some(head.p2);
            node.out_handle = Some(tail.p1);
            for n in out.nodes.iter_mut() {
                if n.id == edge.from {
                    n.out_handle = Some(head.p1);
                }
                if n.id == edge.to {
                    n.in_handle = Some(tail.p2);
                }
            }
        }
    }
    out.nodes.push(node);
    let new_edge_id = ids.next_id("e");
    out.edges[idx].to = node_id.clone();
    out.edges.insert(
        idx + 1,
        Edge {
            id: new_edge_id.clone(),
            from: node_id.clone(),
            to: edge.to.clone(),
            kind: edge.kind,
        },
    );

    // Notches keep their absolute position along the old edge.
    let total = head_len + tail_len;
    let split = if total > EPS_DENOM { head_len / total } else { 0.5 };
    for p in out.piques.iter_mut().filter(|p| p.edge_id == edge.id) {
        if p.t01 > split && split < 1.0 {
            *p = Pique {
                edge_id: new_edge_id.clone(),
                t01: (p.t01 - split) / (1.0 - split),
                ..p.clone()
            };
        } else if split > 0.0 {
            p.t01 /= split;
        }
    }
    Some((out, node_id))
}

/// Where on the target figure a join lands.
enum JoinAt<'s> {
    Node(&'s str),
    Edge(&'s str, f64),
}

/// The figure and location a snap designates, seen from `moving_id`.
fn join_target<'s>(snap: &'s SnapPoint, moving_id: &str) -> Option<(&'s str, JoinAt<'s>)> {
    match snap.kind {
        SnapKind::Endpoint => Some((snap.figure_id.as_str(), JoinAt::Node(snap.node_id.as_deref()?))),
        SnapKind::Intersection if snap.figure_id == moving_id => Some((
            snap.other_figure_id.as_deref()?,
            JoinAt::Edge(snap.other_edge_id.as_deref()?, snap.other_t?),
        )),
        SnapKind::Midpoint | SnapKind::Intersection => Some((
            snap.figure_id.as_str(),
            JoinAt::Edge(snap.edge_id.as_deref()?, snap.t?),
        )),
    }
}

/// Merges figure `moving_id` into the figure owning `snap`, joined at
/// `moving_node`. Endpoint snaps reuse the target node; midpoint and
/// intersection snaps split the target edge first. The moving figure's
/// geometry is re-expressed in the target's local frame, colliding ids are
/// renamed, and the moving node is replaced by the shared node everywhere.
/// The merged figure keeps the target's id; the moving figure and any seam
/// derived from it are removed from the returned list.
pub fn magnet_join(
    figures: &[Figure],
    moving_id: &str,
    moving_node: &str,
    snap: &SnapPoint,
    samples: usize,
    ids: &mut dyn IdSource,
) -> Option<Vec<Figure>> {
    let (target_id, at) = join_target(snap, moving_id)?;
    if target_id == moving_id {
        debug!(figure = moving_id, "magnet join onto the same figure ignored");
        return None;
    }
    let moving = figures.iter().find(|f| f.id == moving_id)?;
    let target = figures.iter().find(|f| f.id == target_id)?;
    if moving.is_seam() || target.is_seam() {
        debug!(moving = moving_id, target = target_id, "seams do not join");
        return None;
    }
    moving.node(moving_node)?;

    let (mut merged, shared) = match at {
        JoinAt::Node(n) => {
            target.node(n)?;
            (target.clone(), n.to_string())
        }
        JoinAt::Edge(edge_id, t) => split_edge_at(target, edge_id, t, samples, ids)?,
    };

    let taken: HashSet<String> = merged
        .nodes
        .iter()
        .map(|n| n.id.clone())
        .chain(merged.edges.iter().map(|e| e.id.clone()))
        .collect();
    let mut rename: HashMap<String, String> = HashMap::new();
    for n in &moving.nodes {
        let id = if n.id == moving_node {
            shared.clone()
        } else if taken.contains(&n.id) {
            ids.next_id("n")
        } else {
            n.id.clone()
        };
        rename.insert(n.id.clone(), id);
    }
    let node_of = |id: &str| rename.get(id).cloned().unwrap_or_else(|| id.to_string());

    let to_target = |p: Vec2| target.to_local(moving.to_world(p));
    for n in &moving.nodes {
        let in_handle = n.in_handle.map(to_target);
        let out_handle = n.out_handle.map(to_target);
        if n.id == moving_node {
            if let Some(s) = merged.nodes.iter_mut().find(|s| s.id == shared) {
                s.in_handle = s.in_handle.or(in_handle);
                s.out_handle = s.out_handle.or(out_handle);
            }
            continue;
        }
        let p = to_target(n.pos());
        merged.nodes.push(Node {
            id: node_of(&n.id),
            x: p.x,
            y: p.y,
            mode: n.mode,
            in_handle,
            out_handle,
        });
    }
    let mut edge_rename: HashMap<&str, String> = HashMap::new();
    for e in &moving.edges {
        let id = if taken.contains(&e.id) {
            ids.next_id("e")
        } else {
            e.id.clone()
        };
        edge_rename.insert(&e.id, id.clone());
        merged.edges.push(Edge {
            id,
            from: node_of(&e.from),
            to: node_of(&e.to),
            kind: e.kind,
        });
    }
    merged.darts.extend(moving.darts.iter().map(|d| {
        let mut d = d.clone();
        d.a_node_id = node_of(&d.a_node_id);
        d.b_node_id = node_of(&d.b_node_id);
        d.c_node_id = node_of(&d.c_node_id);
        d
    }));
    merged.piques.extend(moving.piques.iter().filter_map(|p| {
        Some(Pique {
            edge_id: edge_rename.get(p.edge_id.as_str())?.clone(),
            ..p.clone()
        })
    }));
    merged.closed = target.closed || moving.closed;

    debug!(
        moving = moving_id,
        target = target_id,
        node = %shared,
        nodes = merged.nodes.len(),
        edges = merged.edges.len(),
        "magnet join"
    );
    Some(
        figures
            .iter()
            .filter(|f| f.id != moving_id && f.parent_id() != Some(moving_id))
            .map(|f| if f.id == merged.id { merged.clone() } else { f.clone() })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::snapping::get_all_snap_points;
    use crate::ids::SequentialIds;
    use crate::model::{EdgeKind, Tool};

    fn square(ids: &mut SequentialIds) -> Figure {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(0.0, 100.0),
        ];
        Figure::from_points("sq", Tool::Rectangle, &pts, true, ids)
    }

    #[test]
    fn split_line_edge() {
        let mut ids = SequentialIds::starting_at(100);
        let sq = square(&mut ids);
        let first = sq.edges[0].clone();
        let (out, nid) = split_edge_at(&sq, &first.id, 0.25, 16, &mut ids).unwrap();
        assert_eq!(out.nodes.len(), 5);
        assert_eq!(out.edges.len(), 5);
        assert_eq!(out.node_pos(&nid), Some(Vec2::new(25.0, 0.0)));
        assert_eq!(out.edges[0].to, nid);
        assert_eq!(out.edges[1].from, nid);
        assert_eq!(out.edges[1].to, first.to);
        let (same, end) = split_edge_at(&sq, &first.id, 1.0, 16, &mut ids).unwrap();
        assert_eq!(end, first.to);
        assert_eq!(same, sq);
    }

    #[test]
    fn split_cubic_keeps_shape() {
        let mut ids = SequentialIds::new();
        let mut fig = Figure::from_points(
            "c",
            Tool::Curve,
            &[Vec2::new(0.0, 0.0), Vec2::new(90.0, 0.0)],
            false,
            &mut ids,
        );
        fig.edges[0].kind = EdgeKind::Cubic;
        fig.nodes[0].out_handle = Some(Vec2::new(30.0, 60.0));
        fig.nodes[1].in_handle = Some(Vec2::new(60.0, 60.0));
        let before = FigureGraph::new(&fig).edge_geom(0).unwrap();
        let (out, nid) = split_edge_at(&fig, &fig.edges[0].id, 0.3, 32, &mut ids).unwrap();
        let g = FigureGraph::new(&out);
        assert!(g.pos(&nid).unwrap().distance(before.eval(0.3)) < 1e-9);
        let head = g.edge_geom(0).unwrap();
        let tail = g.edge_geom(1).unwrap();
        assert!(head.eval(0.5).distance(before.eval(0.15)) < 1e-9);
        assert!(tail.eval(0.5).distance(before.eval(0.65)) < 1e-9);
    }

    #[test]
    fn join_on_midpoint_splits_and_shares_node() {
        let mut ids = SequentialIds::starting_at(100);
        let sq = square(&mut ids);
        let mut stroke = Figure::from_points(
            "stroke",
            Tool::Line,
            &[Vec2::new(0.0, 0.0), Vec2::new(50.0, -40.0)],
            false,
            &mut ids,
        );
        stroke.x = 0.0;
        stroke.y = 0.0;
        let figs = vec![sq.clone(), stroke.clone()];
        let snaps = get_all_snap_points(&figs, Some("stroke"), 16);
        let mid = snaps
            .iter()
            .find(|s| s.kind == SnapKind::Midpoint && s.edge_id.as_deref() == Some(sq.edges[0].id.as_str()))
            .unwrap();
        let moving_node = stroke.nodes[1].id.clone();
        let out = magnet_join(&figs, "stroke", &moving_node, mid, 16, &mut ids).unwrap();
        assert_eq!(out.len(), 1);
        let m = &out[0];
        assert_eq!(m.id, "sq");
        assert_eq!(m.edges.len(), sq.edges.len() + stroke.edges.len() + 1);
        assert_eq!(m.nodes.len(), sq.nodes.len() + stroke.nodes.len());
        let shared = m
            .nodes
            .iter()
            .find(|n| n.pos().distance(Vec2::new(50.0, 0.0)) < 1e-9)
            .unwrap();
        assert_eq!(m.edges.iter().filter(|e| e.touches(&shared.id)).count(), 3);
        assert!(m.node(&moving_node).is_none());
    }

    #[test]
    fn join_on_endpoint_reuses_node_and_renames_collisions() {
        let mut ids = SequentialIds::new();
        let sq = square(&mut ids);
        // Same id sequence, so the stroke's node ids collide with the square's.
        let mut ids2 = SequentialIds::new();
        let mut stroke = Figure::from_points(
            "stroke",
            Tool::Line,
            &[Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0)],
            false,
            &mut ids2,
        );
        stroke.x = 100.0;
        stroke.y = 100.0;
        let figs = vec![sq.clone(), stroke.clone()];
        let snap = get_all_snap_points(&figs, Some("stroke"), 16)
            .into_iter()
            .find(|s| s.node_id.as_deref() == Some(sq.nodes[2].id.as_str()))
            .unwrap();
        let mut ids = SequentialIds::starting_at(1000);
        let out = magnet_join(&figs, "stroke", &stroke.nodes[0].id, &snap, 16, &mut ids).unwrap();
        let m = &out[0];
        assert_eq!(m.nodes.len(), 5);
        assert_eq!(m.edges.len(), 5);
        let ids: HashSet<&str> = m.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
        let last = m.edges.last().unwrap();
        assert_eq!(last.from, sq.nodes[2].id);
        assert_eq!(m.node_pos(&last.to), Some(Vec2::new(120.0, 100.0)));
    }
}
