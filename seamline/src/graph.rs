//! Read-only graph view over a [`Figure`]: id lookups, incidence, per-edge
//! geometry, walk order and flattening.

use std::collections::{HashMap, HashSet};

use crate::algorithms::boundary;
use crate::config::DEFAULT_CUBIC_SAMPLES;
use crate::geometry::{
    cubic::CubicBezier,
    flatten::{mean_point, polygon_area, polygon_centroid, FlattenIter},
    path_length::{self, PathPoint},
    tolerance::{EPS_AREA, EPS_POS},
};
use crate::ids::IdSource;
use crate::model::{Edge, EdgeKind, Figure, Node, Tool, Vec2};

/// Resolved geometry of one edge in local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeGeom {
    Line { a: Vec2, b: Vec2 },
    Cubic(CubicBezier),
}

impl EdgeGeom {
    pub fn start(&self) -> Vec2 {
        match self {
            EdgeGeom::Line { a, .. } => *a,
            EdgeGeom::Cubic(c) => c.p0,
        }
    }
    pub fn end(&self) -> Vec2 {
        match self {
            EdgeGeom::Line { b, .. } => *b,
            EdgeGeom::Cubic(c) => c.p3,
        }
    }
    pub fn reversed(&self) -> EdgeGeom {
        match self {
            EdgeGeom::Line { a, b } => EdgeGeom::Line { a: *b, b: *a },
            EdgeGeom::Cubic(c) => EdgeGeom::Cubic(CubicBezier::new(c.p3, c.p2, c.p1, c.p0)),
        }
    }
    /// Straight edges yield their two endpoints; cubic edges `samples + 1`
    /// uniformly spaced points.
    pub fn polyline(&self, samples: usize) -> Vec<Vec2> {
        match self {
            EdgeGeom::Line { a, b } => vec![*a, *b],
            EdgeGeom::Cubic(c) => c.sample(samples),
        }
    }
    pub fn length(&self, samples: usize) -> f64 {
        match self {
            EdgeGeom::Line { a, b } => a.distance(*b),
            EdgeGeom::Cubic(c) => c.approx_length(samples),
        }
    }
    /// Zero-length edges are tolerated in figures but ignored by the algorithms.
    pub fn is_degenerate(&self) -> bool {
        match self {
            EdgeGeom::Line { a, b } => a.distance(*b) < EPS_POS,
            EdgeGeom::Cubic(c) => {
                c.p0.distance(c.p3) < EPS_POS
                    && c.p0.distance(c.p1) < EPS_POS
                    && c.p0.distance(c.p2) < EPS_POS
            }
        }
    }
    /// Unit direction of travel leaving the start point.
    pub fn start_direction(&self) -> Vec2 {
        match self {
            EdgeGeom::Line { a, b } => (*b - *a).normalize(),
            EdgeGeom::Cubic(c) => c.direction(0.0),
        }
    }
    /// Unit direction of travel arriving at the end point.
    pub fn end_direction(&self) -> Vec2 {
        match self {
            EdgeGeom::Line { a, b } => (*b - *a).normalize(),
            EdgeGeom::Cubic(c) => c.direction(1.0),
        }
    }
    pub fn midpoint(&self) -> Vec2 {
        match self {
            EdgeGeom::Line { a, b } => a.midpoint(*b),
            EdgeGeom::Cubic(c) => c.eval(0.5),
        }
    }
    /// Curve parameter -> point.
    pub fn eval(&self, t: f64) -> Vec2 {
        match self {
            EdgeGeom::Line { a, b } => a.lerp(*b, t),
            EdgeGeom::Cubic(c) => c.eval(t),
        }
    }
    /// Point at fraction `ratio` of the arc length, with its tangent.
    pub fn point_at_ratio(&self, ratio: f64, samples: usize) -> Option<PathPoint> {
        path_length::point_at_ratio(&self.polyline(samples), ratio)
    }
}

/// One edge traversed in a given direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WalkStep {
    pub edge: usize,
    pub forward: bool,
}

pub struct FigureGraph<'a> {
    figure: &'a Figure,
    node_index: HashMap<&'a str, usize>,
    incidence: HashMap<&'a str, Vec<usize>>, // node id -> indices of valid edges
}

impl<'a> FigureGraph<'a> {
    pub fn new(figure: &'a Figure) -> Self {
        let mut node_index = HashMap::with_capacity(figure.nodes.len());
        for (i, n) in figure.nodes.iter().enumerate() {
            node_index.entry(n.id.as_str()).or_insert(i);
        }
        let mut incidence: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, e) in figure.edges.iter().enumerate() {
            if e.from == e.to
                || !node_index.contains_key(e.from.as_str())
                || !node_index.contains_key(e.to.as_str())
            {
                continue;
            }
            incidence.entry(e.from.as_str()).or_default().push(i);
            incidence.entry(e.to.as_str()).or_default().push(i);
        }
        FigureGraph {
            figure,
            node_index,
            incidence,
        }
    }

    pub fn figure(&self) -> &'a Figure {
        self.figure
    }
    pub fn node(&self, id: &str) -> Option<&'a Node> {
        self.node_index.get(id).map(|&i| &self.figure.nodes[i])
    }
    pub fn pos(&self, id: &str) -> Option<Vec2> {
        self.node(id).map(Node::pos)
    }
    pub fn edge(&self, idx: usize) -> Option<&'a Edge> {
        self.figure.edges.get(idx)
    }
    pub fn edge_index(&self, id: &str) -> Option<usize> {
        self.figure.edges.iter().position(|e| e.id == id)
    }
    /// Indices of valid edges touching `node`.
    pub fn incident(&self, node: &str) -> &[usize] {
        self.incidence.get(node).map_or(&[], Vec::as_slice)
    }
    pub fn degree(&self, node: &str) -> usize {
        self.incident(node).len()
    }
    /// Edges whose endpoints both exist and differ.
    pub fn valid_edges(&self) -> impl Iterator<Item = usize> + '_ {
        let mut seen = HashSet::new();
        self.figure
            .nodes
            .iter()
            .flat_map(move |n| self.incident(&n.id).iter().copied())
            .filter(move |i| seen.insert(*i))
    }

    pub fn edge_geom(&self, idx: usize) -> Option<EdgeGeom> {
        let e = self.figure.edges.get(idx)?;
        let a = self.node(&e.from)?;
        let b = self.node(&e.to)?;
        Some(match e.kind {
            EdgeKind::Line => EdgeGeom::Line {
                a: a.pos(),
                b: b.pos(),
            },
            EdgeKind::Cubic => EdgeGeom::Cubic(CubicBezier::new(
                a.pos(),
                a.out_handle.unwrap_or(a.pos()),
                b.in_handle.unwrap_or(b.pos()),
                b.pos(),
            )),
        })
    }

    pub fn step_geom(&self, step: WalkStep) -> Option<EdgeGeom> {
        let g = self.edge_geom(step.edge)?;
        Some(if step.forward { g } else { g.reversed() })
    }

    /// (start, end) node ids of a step.
    pub fn step_nodes(&self, step: WalkStep) -> Option<(&'a str, &'a str)> {
        let e = self.figure.edges.get(step.edge)?;
        Some(if step.forward {
            (e.from.as_str(), e.to.as_str())
        } else {
            (e.to.as_str(), e.from.as_str())
        })
    }

    /// Edge walk covering every valid edge, one chain per connected stroke.
    /// For closed figures the first chain is the traced outer loop when one exists.
    pub fn chains(&self) -> Vec<Vec<WalkStep>> {
        self.sampled_chains(DEFAULT_CUBIC_SAMPLES)
    }

    fn sampled_chains(&self, samples: usize) -> Vec<Vec<WalkStep>> {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut chains = Vec::new();
        if self.figure.closed {
            if let Some(trace) = boundary::trace(self, samples) {
                visited.extend(trace.steps.iter().map(|s| s.edge));
                chains.push(trace.steps);
            }
        }
        let unvisited_degree = |node: &str, visited: &HashSet<usize>| {
            self.incident(node)
                .iter()
                .filter(|i| !visited.contains(i))
                .count()
        };
        loop {
            // Prefer chain ends so open strokes are walked end to end.
            let start = self
                .figure
                .nodes
                .iter()
                .find(|n| unvisited_degree(&n.id, &visited) == 1)
                .or_else(|| {
                    self.figure
                        .nodes
                        .iter()
                        .find(|n| unvisited_degree(&n.id, &visited) > 0)
                });
            let Some(start) = start else { break };
            let mut chain = Vec::new();
            let mut cur = start.id.as_str();
            while let Some(&idx) = self.incident(cur).iter().find(|i| !visited.contains(i)) {
                visited.insert(idx);
                let e = &self.figure.edges[idx];
                let forward = e.from == cur;
                chain.push(WalkStep { edge: idx, forward });
                cur = if forward { &e.to } else { &e.from };
            }
            chains.push(chain);
        }
        chains
    }

    /// Node ids visited by a chain, first node included.
    pub fn chain_nodes(&self, chain: &[WalkStep]) -> Vec<&'a str> {
        let mut out = Vec::with_capacity(chain.len() + 1);
        for (i, step) in chain.iter().enumerate() {
            if let Some((a, b)) = self.step_nodes(*step) {
                if i == 0 {
                    out.push(a);
                }
                out.push(b);
            }
        }
        out
    }

    /// Lazily flattened primary chain (outer loop for closed figures).
    pub fn flatten_iter(&self, samples: usize) -> FlattenIter<'_, 'a> {
        let steps = self.sampled_chains(samples).into_iter().next().unwrap_or_default();
        FlattenIter::new(self, steps, samples)
    }

    pub fn flatten(&self, samples: usize) -> Vec<Vec2> {
        self.flatten_iter(samples).collect()
    }

    /// Every chain flattened separately.
    pub fn flatten_all(&self, samples: usize) -> Vec<Vec<Vec2>> {
        self.sampled_chains(samples)
            .into_iter()
            .map(|c| FlattenIter::new(self, c, samples).collect())
            .collect()
    }

    /// Polygon centroid of the outer loop for closed figures, otherwise the
    /// mean of the flattened samples (node mean when there are no edges).
    pub fn centroid(&self, samples: usize) -> Vec2 {
        let pts = self.flatten(samples);
        if self.figure.closed && pts.len() >= 3 && polygon_area(&pts).abs() > EPS_AREA {
            return polygon_centroid(&pts);
        }
        if !pts.is_empty() {
            return mean_point(&pts);
        }
        let nodes: Vec<Vec2> = self.figure.nodes.iter().map(Node::pos).collect();
        mean_point(&nodes)
    }
}

impl Figure {
    /// Straight-edged figure through `points` (local coordinates).
    pub fn from_points(
        id: impl Into<String>,
        tool: Tool,
        points: &[Vec2],
        closed: bool,
        ids: &mut dyn IdSource,
    ) -> Figure {
        let mut fig = Figure::new(id, tool);
        fig.nodes = points
            .iter()
            .map(|p| Node::new(ids.next_id("n"), p.x, p.y))
            .collect();
        let n = fig.nodes.len();
        for i in 1..n {
            fig.edges.push(Edge::line(
                ids.next_id("e"),
                fig.nodes[i - 1].id.clone(),
                fig.nodes[i].id.clone(),
            ));
        }
        fig.closed = closed && n >= 3;
        if fig.closed {
            fig.edges.push(Edge::line(
                ids.next_id("e"),
                fig.nodes[n - 1].id.clone(),
                fig.nodes[0].id.clone(),
            ));
        }
        fig
    }

    pub fn flatten(&self, samples: usize) -> Vec<Vec2> {
        FigureGraph::new(self).flatten(samples)
    }

    pub fn centroid(&self, samples: usize) -> Vec2 {
        FigureGraph::new(self).centroid(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn square() -> Figure {
        let mut ids = SequentialIds::new();
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        Figure::from_points("sq", Tool::Rectangle, &pts, true, &mut ids)
    }

    #[test]
    fn builder_closes_loop() {
        let f = square();
        assert_eq!(f.nodes.len(), 4);
        assert_eq!(f.edges.len(), 4);
        assert!(f.closed);
        let g = FigureGraph::new(&f);
        assert!(f.nodes.iter().all(|n| g.degree(&n.id) == 2));
    }

    #[test]
    fn flatten_closed_square_returns_to_start() {
        let f = square();
        let pts = f.flatten(8);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts.first(), pts.last());
        let c = f.centroid(8);
        assert!(c.distance(Vec2::new(5.0, 5.0)) < 1e-9);
    }

    #[test]
    fn open_chain_starts_at_endpoint() {
        let mut ids = SequentialIds::new();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(5.0, 5.0)];
        let mut f = Figure::from_points("l", Tool::Polyline, &pts, false, &mut ids);
        // Scramble edge order; walk must still go end to end.
        f.edges.reverse();
        let g = FigureGraph::new(&f);
        let chains = g.chains();
        assert_eq!(chains.len(), 1);
        let nodes = g.chain_nodes(&chains[0]);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], f.nodes[0].id);
        assert_eq!(nodes[2], f.nodes[2].id);
    }

    #[test]
    fn cubic_edges_are_sampled() {
        let mut f = Figure::new("c", Tool::Curve);
        let mut a = Node::new("a", 0.0, 0.0);
        a.out_handle = Some(Vec2::new(0.0, 30.0));
        let mut b = Node::new("b", 90.0, 0.0);
        b.in_handle = Some(Vec2::new(90.0, 30.0));
        f.nodes = vec![a, b];
        f.edges = vec![Edge {
            id: "e".into(),
            from: "a".into(),
            to: "b".into(),
            kind: EdgeKind::Cubic,
        }];
        let pts = f.flatten(10);
        assert_eq!(pts.len(), 11);
        assert!(pts.iter().all(|p| p.is_finite()));
        assert!(pts[5].y > 20.0);
    }

    #[test]
    fn dangling_edge_is_ignored() {
        let mut f = square();
        f.edges.push(Edge::line("bad", f.nodes[0].id.clone(), "missing"));
        let g = FigureGraph::new(&f);
        assert_eq!(g.valid_edges().count(), 4);
    }
}
