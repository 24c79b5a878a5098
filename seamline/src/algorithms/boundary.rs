//! Outer boundary extraction.
//!
//! Walks the figure graph from its lowest vertex taking the largest signed
//! turn at every node, which in y-down screen coordinates is the clockwise-most
//! continuation and keeps the exterior on one side. Self-touching vertices are
//! passed through (they appear twice in the node sequence); internal branch
//! edges and holes are never entered.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DEFAULT_CUBIC_SAMPLES;
use crate::geometry::{
    intersect::segments_cross,
    math::normalize_angle,
    tolerance::{EPS_ANG, EPS_POS},
};
use crate::graph::{FigureGraph, WalkStep};
use crate::model::{Figure, Vec2};

/// The single exterior loop of a figure. `node_ids` has one more entry than
/// `edge_ids`: the start node is repeated at the end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OuterBoundary {
    pub edge_ids: Vec<String>,
    pub node_ids: Vec<String>,
}

pub(crate) struct Trace<'a> {
    pub steps: Vec<WalkStep>,
    pub nodes: Vec<&'a str>,
}

pub fn trace_outer_boundary(figure: &Figure) -> Option<OuterBoundary> {
    let graph = FigureGraph::new(figure);
    let t = trace(&graph, DEFAULT_CUBIC_SAMPLES)?;
    Some(OuterBoundary {
        edge_ids: t
            .steps
            .iter()
            .map(|s| figure.edges[s.edge].id.clone())
            .collect(),
        node_ids: t.nodes.iter().map(|n| n.to_string()).collect(),
    })
}

/// Nodes joined by degenerate edges collapse onto one representative.
struct Collapse<'a> {
    parent: HashMap<&'a str, &'a str>,
}

impl<'a> Collapse<'a> {
    fn find(&self, mut id: &'a str) -> &'a str {
        while let Some(&p) = self.parent.get(id) {
            id = p;
        }
        id
    }
    fn union(&mut self, a: &'a str, b: &'a str) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent.insert(rb, ra);
        }
    }
}

struct Ctx<'g, 'a> {
    graph: &'g FigureGraph<'a>,
    collapse: Collapse<'a>,
    incidence: HashMap<&'a str, Vec<usize>>,
}

impl<'g, 'a> Ctx<'g, 'a> {
    fn endpoints(&self, step: WalkStep) -> (&'a str, &'a str) {
        let e = &self.graph.figure().edges[step.edge];
        let (from, to) = (self.collapse.find(&e.from), self.collapse.find(&e.to));
        if step.forward {
            (from, to)
        } else {
            (to, from)
        }
    }
    /// Direction of travel leaving the step's start.
    fn out_dir(&self, step: WalkStep) -> Vec2 {
        self.graph
            .step_geom(step)
            .map_or(Vec2::ZERO, |g| g.start_direction())
    }
    /// Direction of travel arriving at the step's end.
    fn in_dir(&self, step: WalkStep) -> Vec2 {
        self.graph
            .step_geom(step)
            .map_or(Vec2::ZERO, |g| g.end_direction())
    }
    fn step_from(&self, node: &str, edge: usize) -> WalkStep {
        let e = &self.graph.figure().edges[edge];
        WalkStep {
            edge,
            forward: self.collapse.find(&e.from) == node,
        }
    }
    /// Largest signed turn out of `node` after arriving via `arrived`.
    fn next_step(&self, node: &str, arrived: WalkStep) -> Option<WalkStep> {
        let in_angle = self.in_dir(arrived).angle();
        let mut best: Option<(WalkStep, f64)> = None;
        for &idx in self.incidence.get(node).map_or(&[][..], Vec::as_slice) {
            if idx == arrived.edge {
                continue;
            }
            let cand = self.step_from(node, idx);
            let turn = normalize_angle(self.out_dir(cand).angle() - in_angle);
            if best.map_or(true, |(_, b)| turn > b + EPS_ANG) {
                best = Some((cand, turn));
            }
        }
        best.map(|(s, _)| s)
    }
}

/// `samples` is the per-cubic flattening used by the crossing check.
pub(crate) fn trace<'a>(graph: &FigureGraph<'a>, samples: usize) -> Option<Trace<'a>> {
    let figure = graph.figure();
    let valid: Vec<usize> = graph.valid_edges().collect();

    let mut collapse = Collapse {
        parent: HashMap::new(),
    };
    for &idx in &valid {
        if graph.edge_geom(idx).is_some_and(|g| g.is_degenerate()) {
            let e = &figure.edges[idx];
            collapse.union(&e.from, &e.to);
        }
    }
    let mut incidence: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut edge_count = 0usize;
    for &idx in &valid {
        if graph.edge_geom(idx).map_or(true, |g| g.is_degenerate()) {
            continue;
        }
        let e = &figure.edges[idx];
        let (a, b) = (collapse.find(&e.from), collapse.find(&e.to));
        if a == b {
            continue;
        }
        incidence.entry(a).or_default().push(idx);
        incidence.entry(b).or_default().push(idx);
        edge_count += 1;
    }
    let ctx = Ctx {
        graph,
        collapse,
        incidence,
    };

    // Lowest y, then lowest x, among nodes that can be part of a loop.
    let mut start: Option<(&str, Vec2)> = None;
    for n in &figure.nodes {
        let id = n.id.as_str();
        if ctx.collapse.find(id) != id || ctx.incidence.get(id).map_or(0, Vec::len) < 2 {
            continue;
        }
        let p = n.pos();
        let better = match start {
            None => true,
            Some((_, b)) => p.y < b.y - EPS_POS || ((p.y - b.y).abs() <= EPS_POS && p.x < b.x),
        };
        if better {
            start = Some((id, p));
        }
    }
    let Some((start, _)) = start else {
        debug!(figure = %figure.id, "no node with two incident edges");
        return None;
    };

    let mut first: Option<(WalkStep, f64)> = None;
    for &idx in &ctx.incidence[start] {
        let cand = ctx.step_from(start, idx);
        let ang = ctx.out_dir(cand).angle();
        if first.map_or(true, |(_, b)| ang > b + EPS_ANG) {
            first = Some((cand, ang));
        }
    }
    let (first, _) = first?;

    let cap = 3 * edge_count;
    let mut used: HashSet<WalkStep> = HashSet::new();
    let mut steps: Vec<WalkStep> = Vec::new();
    let mut nodes: Vec<&str> = vec![start];
    let mut cur = first;
    let mut iterations = 0usize;
    loop {
        if iterations >= cap {
            warn!(figure = %figure.id, cap, "outer boundary trace hit iteration cap");
            return None;
        }
        iterations += 1;
        if !used.insert(cur) {
            return close_on_revisit(figure, steps, nodes, cur, start).and_then(|t| finish(graph, t, samples));
        }
        steps.push(cur);
        let (_, next) = ctx.endpoints(cur);
        nodes.push(next);
        let Some(after) = ctx.next_step(next, cur) else {
            if next == start {
                break;
            }
            debug!(figure = %figure.id, node = next, "outer boundary trace reached a dead end");
            return None;
        };
        // Back at the start: the loop is closed once the walk would repeat
        // its first step; otherwise the start is a touching vertex.
        if next == start && after == first {
            break;
        }
        cur = after;
    }
    finish(graph, Trace { steps, nodes }, samples)
}

fn close_on_revisit<'a>(
    graph_figure: &Figure,
    steps: Vec<WalkStep>,
    nodes: Vec<&'a str>,
    repeated: WalkStep,
    start: &'a str,
) -> Option<Trace<'a>> {
    let k = steps.iter().position(|s| *s == repeated)?;
    let cycle_steps = steps[k..].to_vec();
    let cycle_nodes = nodes[k..].to_vec();
    if cycle_steps.len() < 3 || !cycle_nodes.contains(&start) {
        debug!(figure = %graph_figure.id, "trace revisited an edge without closing at the start");
        return None;
    }
    // Rotate so the loop starts and ends at the start node.
    let r = cycle_nodes.iter().position(|n| *n == start)?;
    let m = cycle_steps.len();
    let steps: Vec<WalkStep> = (0..m).map(|i| cycle_steps[(r + i) % m]).collect();
    let mut nodes: Vec<&str> = (0..m).map(|i| cycle_nodes[(r + i) % m]).collect();
    nodes.push(start);
    Some(Trace { steps, nodes })
}

fn finish<'a>(graph: &FigureGraph<'a>, t: Trace<'a>, samples: usize) -> Option<Trace<'a>> {
    if t.steps.len() < 3 {
        debug!(figure = %graph.figure().id, edges = t.steps.len(), "outer loop too short");
        return None;
    }
    if has_crossing(graph, &t.steps, samples) {
        debug!(figure = %graph.figure().id, "outer loop self-intersects");
        return None;
    }
    Some(t)
}

/// Proper crossings between the flattened edges of the loop. Touches at
/// shared vertices do not count.
fn has_crossing(graph: &FigureGraph, steps: &[WalkStep], samples: usize) -> bool {
    let polys: Vec<Vec<Vec2>> = steps
        .iter()
        .filter_map(|s| graph.step_geom(*s))
        .map(|g| g.polyline(samples))
        .collect();
    let bbox = |pts: &[Vec2]| {
        pts.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    };
    let boxes: Vec<_> = polys.iter().map(|p| bbox(p)).collect();
    for i in 0..polys.len() {
        for j in (i + 1)..polys.len() {
            let (a, b) = (boxes[i], boxes[j]);
            if a.2 < b.0 || b.2 < a.0 || a.3 < b.1 || b.3 < a.1 {
                continue;
            }
            for sa in polys[i].windows(2) {
                for sb in polys[j].windows(2) {
                    if segments_cross(sa[0], sa[1], sb[0], sb[1]) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, EdgeKind, Node, Tool};

    fn fig(nodes: &[(&str, f64, f64)], edges: &[(&str, &str, &str)]) -> Figure {
        let mut f = Figure::new("f", Tool::Polyline);
        f.closed = true;
        f.nodes = nodes.iter().map(|(id, x, y)| Node::new(*id, *x, *y)).collect();
        f.edges = edges.iter().map(|(id, a, b)| Edge::line(*id, *a, *b)).collect();
        f
    }

    #[test]
    fn square_loop() {
        let f = fig(
            &[("a", 200.0, 200.0), ("b", 300.0, 200.0), ("c", 300.0, 300.0), ("d", 200.0, 300.0)],
            &[("ab", "a", "b"), ("bc", "b", "c"), ("cd", "c", "d"), ("da", "d", "a")],
        );
        let b = trace_outer_boundary(&f).unwrap();
        assert_eq!(b.edge_ids.len(), 4);
        assert_eq!(b.node_ids.len(), 5);
        assert_eq!(b.node_ids.first(), b.node_ids.last());
        assert_eq!(b.node_ids[0], "a");
        // Largest outgoing angle from (200,200) is straight down the left side.
        assert_eq!(b.edge_ids[0], "da");
    }

    #[test]
    fn internal_branch_is_skipped() {
        let f = fig(
            &[("a", 0.0, 0.0), ("b", 100.0, 0.0), ("c", 100.0, 100.0), ("d", 0.0, 100.0), ("x", 50.0, 50.0)],
            &[("ab", "a", "b"), ("bc", "b", "c"), ("cd", "c", "d"), ("da", "d", "a"), ("ax", "a", "x")],
        );
        let b = trace_outer_boundary(&f).unwrap();
        assert_eq!(b.edge_ids.len(), 4);
        assert!(!b.edge_ids.contains(&"ax".to_string()));
    }

    #[test]
    fn degenerate_edge_is_collapsed() {
        let f = fig(
            &[("a", 0.0, 0.0), ("a2", 0.0, 0.0), ("b", 100.0, 0.0), ("c", 100.0, 100.0)],
            &[("aa", "a", "a2"), ("ab", "a2", "b"), ("bc", "b", "c"), ("ca", "c", "a")],
        );
        let b = trace_outer_boundary(&f).unwrap();
        assert_eq!(b.edge_ids.len(), 3);
        assert!(!b.edge_ids.contains(&"aa".to_string()));
    }

    #[test]
    fn open_path_has_no_boundary() {
        let f = fig(
            &[("a", 0.0, 0.0), ("b", 10.0, 0.0), ("c", 10.0, 10.0)],
            &[("ab", "a", "b"), ("bc", "b", "c")],
        );
        assert!(trace_outer_boundary(&f).is_none());
    }

    #[test]
    fn bowtie_crossing_is_rejected() {
        let f = fig(
            &[("a", 0.0, 0.0), ("b", 100.0, 100.0), ("c", 100.0, 0.0), ("d", 0.0, 100.0)],
            &[("ab", "a", "b"), ("bc", "b", "c"), ("cd", "c", "d"), ("da", "d", "a")],
        );
        assert!(trace_outer_boundary(&f).is_none());
    }

    #[test]
    fn crossing_check_follows_the_sample_count() {
        // The chord of `ab` is the top of a plain triangle, but the curve
        // itself dips through both lines into `c`.
        let mut f = fig(
            &[("a", 0.0, 0.0), ("b", 100.0, 0.0), ("c", 50.0, 100.0)],
            &[("ab", "a", "b"), ("bc", "b", "c"), ("ca", "c", "a")],
        );
        f.edges[0].kind = EdgeKind::Cubic;
        f.nodes[0].out_handle = Some(Vec2::new(0.0, 100.0));
        f.nodes[1].in_handle = Some(Vec2::new(100.0, 100.0));
        let graph = FigureGraph::new(&f);
        assert!(trace(&graph, 1).is_some());
        assert!(trace(&graph, 32).is_none());
    }
}
