//! Seam allowance generation from the traced outer loop.
//!
//! Each contributing loop edge is offset outward on its own (raw segment,
//! stored in `seam_segments`), then neighbouring segments are joined with a
//! miter or a bevel. Edges of holes or internal branches never contribute
//! because they are never part of the traced loop.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::boundary;
use crate::config::{EngineConfig, DEFAULT_CUBIC_SAMPLES, DEFAULT_MITER_LIMIT};
use crate::geometry::{
    flatten::{dedupe_consecutive, point_in_polygon, polygon_area, FlattenIter},
    intersect::intersect_lines,
    tolerance::{EPS_AREA, EPS_POS},
};
use crate::graph::{EdgeGeom, FigureGraph, WalkStep};
use crate::ids::IdSource;
use crate::model::{Edge, EdgeId, Figure, FigureRole, Node, OffsetSpec, Tool, Vec2};

/// Which part of the base figure a seam is generated for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "edgeId", rename_all = "lowercase")]
pub enum OffsetSelector {
    Whole,
    Edge(EdgeId),
}

/// Outcome of an edit to a seam figure.
#[derive(Clone, Debug, PartialEq)]
pub enum SeamEdit {
    Replace(Figure),
    /// No edge carries a value any more; the seam figure should be deleted.
    Remove,
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeamOptions {
    pub px_per_cm: f64,
    pub samples: usize,
    pub miter_limit: f64,
}

impl SeamOptions {
    pub fn new(px_per_cm: f64) -> Self {
        SeamOptions {
            px_per_cm,
            samples: DEFAULT_CUBIC_SAMPLES,
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }
    pub fn from_config(cfg: &EngineConfig) -> Self {
        SeamOptions {
            px_per_cm: cfg.px_per_cm,
            samples: cfg.cubic_samples,
            miter_limit: cfg.miter_limit,
        }
    }
    fn usable(&self) -> bool {
        self.px_per_cm.is_finite() && self.px_per_cm > 0.0 && self.samples > 0
    }
}

fn valid_value(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

pub fn compute_offset(
    base: &Figure,
    selector: &OffsetSelector,
    value_cm: f64,
    px_per_cm: f64,
    ids: &mut dyn IdSource,
) -> Option<Figure> {
    compute_offset_with(base, selector, value_cm, &SeamOptions::new(px_per_cm), ids)
}

pub fn compute_offset_with(
    base: &Figure,
    selector: &OffsetSelector,
    value_cm: f64,
    opts: &SeamOptions,
    ids: &mut dyn IdSource,
) -> Option<Figure> {
    if !valid_value(value_cm) {
        debug!(figure = %base.id, value_cm, "offset value must be positive");
        return None;
    }
    let spec = match selector {
        OffsetSelector::Whole => OffsetSpec::Uniform(value_cm),
        OffsetSelector::Edge(id) => OffsetSpec::PerEdge(BTreeMap::from([(id.clone(), value_cm)])),
    };
    let graph = FigureGraph::new(base);
    let lp = OuterLoop::new(&graph, opts)?;
    if let OffsetSelector::Edge(id) = selector {
        if !lp.contains_edge(id) {
            debug!(figure = %base.id, edge = %id, "edge is not on the outer loop");
            return None;
        }
    }
    lp.build(spec, None, &HashMap::new(), opts, ids)
}

/// Adds `edge_id` to the per-edge map with `value_cm`, or removes it when
/// already present. A uniform seam is first expanded to one entry per loop edge.
pub fn toggle_edge_offset(
    base: &Figure,
    seam: Option<&Figure>,
    edge_id: &str,
    value_cm: f64,
    opts: &SeamOptions,
    ids: &mut dyn IdSource,
) -> SeamEdit {
    edit_per_edge(base, seam, edge_id, opts, ids, |map| {
        if map.remove(edge_id).is_none() {
            if !valid_value(value_cm) {
                return false;
            }
            map.insert(edge_id.to_string(), value_cm);
        }
        true
    })
}

/// Sets one edge's value (a non-positive value removes it). Segments of the
/// other edges are reused from the existing seam.
pub fn set_edge_offset(
    base: &Figure,
    seam: Option<&Figure>,
    edge_id: &str,
    value_cm: f64,
    opts: &SeamOptions,
    ids: &mut dyn IdSource,
) -> SeamEdit {
    if !value_cm.is_finite() {
        return SeamEdit::Unchanged;
    }
    edit_per_edge(base, seam, edge_id, opts, ids, |map| {
        if value_cm > 0.0 {
            map.insert(edge_id.to_string(), value_cm);
        } else {
            map.remove(edge_id);
        }
        true
    })
}

/// Recomputes a seam from its stored offset values, e.g. after the parent moved.
pub fn rebuild_seam(
    base: &Figure,
    seam: &Figure,
    opts: &SeamOptions,
    ids: &mut dyn IdSource,
) -> SeamEdit {
    let Some(spec) = seam.offset_cm.clone() else {
        return SeamEdit::Unchanged;
    };
    let graph = FigureGraph::new(base);
    let Some(lp) = OuterLoop::new(&graph, opts) else {
        return SeamEdit::Unchanged;
    };
    let spec = match spec {
        OffsetSpec::Uniform(v) if !valid_value(v) => return SeamEdit::Unchanged,
        OffsetSpec::PerEdge(mut m) => {
            m.retain(|id, v| lp.contains_edge(id) && valid_value(*v));
            if m.is_empty() {
                return SeamEdit::Remove;
            }
            OffsetSpec::PerEdge(m)
        }
        s => s,
    };
    match lp.build(spec, Some(&seam.id), &HashMap::new(), opts, ids) {
        Some(f) => SeamEdit::Replace(f),
        None => SeamEdit::Unchanged,
    }
}

fn edit_per_edge(
    base: &Figure,
    seam: Option<&Figure>,
    edge_id: &str,
    opts: &SeamOptions,
    ids: &mut dyn IdSource,
    apply: impl FnOnce(&mut BTreeMap<EdgeId, f64>) -> bool,
) -> SeamEdit {
    let graph = FigureGraph::new(base);
    let Some(lp) = OuterLoop::new(&graph, opts) else {
        return SeamEdit::Unchanged;
    };
    if !lp.contains_edge(edge_id) {
        debug!(figure = %base.id, edge = edge_id, "edge is not on the outer loop");
        return SeamEdit::Unchanged;
    }
    let mut map = match seam.and_then(|s| s.offset_cm.as_ref()) {
        Some(OffsetSpec::PerEdge(m)) => m.clone(),
        Some(OffsetSpec::Uniform(v)) => lp
            .edge_ids()
            .map(|id| (id.to_string(), *v))
            .collect(),
        None => BTreeMap::new(),
    };
    if !apply(&mut map) {
        return SeamEdit::Unchanged;
    }
    map.retain(|id, v| lp.contains_edge(id) && valid_value(*v));
    if map.is_empty() {
        return SeamEdit::Remove;
    }

    // Raw segments of untouched edges are reused when their value is unchanged.
    let mut cached: HashMap<&str, &Vec<Vec2>> = HashMap::new();
    if let Some(s) = seam {
        let old_value = |id: &str| match &s.offset_cm {
            Some(OffsetSpec::PerEdge(m)) => m.get(id).copied(),
            Some(OffsetSpec::Uniform(v)) => Some(*v),
            None => None,
        };
        for (id, seg) in s.seam_segment_edge_ids.iter().zip(&s.seam_segments) {
            if id != edge_id && old_value(id) == map.get(id.as_str()).copied() {
                cached.insert(id.as_str(), seg);
            }
        }
    }
    match lp.build(
        OffsetSpec::PerEdge(map),
        seam.map(|s| s.id.as_str()),
        &cached,
        opts,
        ids,
    ) {
        Some(f) => SeamEdit::Replace(f),
        None => SeamEdit::Unchanged,
    }
}

struct OuterLoop<'g, 'a> {
    graph: &'g FigureGraph<'a>,
    steps: Vec<WalkStep>,
    polygon: Vec<Vec2>,
    area: f64,
    centroid: Vec2,
}

impl<'g, 'a> OuterLoop<'g, 'a> {
    fn new(graph: &'g FigureGraph<'a>, opts: &SeamOptions) -> Option<Self> {
        let fig = graph.figure();
        if !fig.closed {
            debug!(figure = %fig.id, "offset requires a closed figure");
            return None;
        }
        if !opts.usable() {
            return None;
        }
        let trace = boundary::trace(graph, opts.samples)?;
        let polygon: Vec<Vec2> =
            FlattenIter::new(graph, trace.steps.clone(), opts.samples).collect();
        let area = polygon_area(&polygon);
        let centroid = graph.centroid(opts.samples);
        Some(OuterLoop {
            graph,
            steps: trace.steps,
            polygon,
            area,
            centroid,
        })
    }

    fn edge_id(&self, step: &WalkStep) -> &'a str {
        &self.graph.figure().edges[step.edge].id
    }
    fn edge_ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.steps.iter().map(|s| self.edge_id(s))
    }
    fn contains_edge(&self, id: &str) -> bool {
        self.edge_ids().any(|e| e == id)
    }

    /// Which side of the walk is outside: +1 for the left normal `perp()`,
    /// -1 for the right one. Derived from winding, then verified with a
    /// probe point against the loop polygon.
    fn outward_sign(&self, geom: &EdgeGeom, samples: usize) -> f64 {
        let mid = geom.point_at_ratio(0.5, samples);
        let Some(mid) = mid else { return 1.0 };
        let n = mid.tangent.perp();
        if self.area.abs() <= EPS_AREA {
            // Degenerate loop: push away from the centroid.
            return if (mid.pos - self.centroid).dot(n) >= 0.0 { 1.0 } else { -1.0 };
        }
        // Positive shoelace area means the interior lies on the left.
        let mut sign = if self.area > 0.0 { -1.0 } else { 1.0 };
        let probe_len = (geom.length(samples) * 0.01).clamp(EPS_POS * 10.0, 0.5);
        if point_in_polygon(mid.pos + n * (sign * probe_len), &self.polygon) {
            sign = -sign;
        }
        sign
    }

    fn offset_step(&self, step: WalkStep, dist: f64, samples: usize) -> Option<Vec<Vec2>> {
        let geom = self.graph.step_geom(step)?;
        if geom.is_degenerate() {
            return None;
        }
        let sign = self.outward_sign(&geom, samples);
        let pts = match geom {
            EdgeGeom::Line { a, b } => {
                let n = (b - a).normalize().perp() * (sign * dist);
                vec![a + n, b + n]
            }
            EdgeGeom::Cubic(c) => {
                let steps = samples.max(1);
                (0..=steps)
                    .map(|i| {
                        let t = i as f64 / steps as f64;
                        c.eval(t) + c.direction(t).perp() * (sign * dist)
                    })
                    .collect()
            }
        };
        Some(pts)
    }

    fn build(
        &self,
        spec: OffsetSpec,
        seam_id: Option<&str>,
        cached: &HashMap<&str, &Vec<Vec2>>,
        opts: &SeamOptions,
        ids: &mut dyn IdSource,
    ) -> Option<Figure> {
        let value_for = |id: &str| match &spec {
            OffsetSpec::Uniform(v) => Some(*v),
            OffsetSpec::PerEdge(m) => m.get(id).copied(),
        };
        // (loop position, distance px, raw segment)
        let mut segs: Vec<(usize, f64, Vec<Vec2>)> = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            let id = self.edge_id(step);
            let Some(v) = value_for(id).filter(|v| valid_value(*v)) else {
                continue;
            };
            let dist = v * opts.px_per_cm;
            let raw = match cached.get(id) {
                Some(seg) if seg.len() >= 2 => (*seg).clone(),
                _ => match self.offset_step(*step, dist, opts.samples) {
                    Some(s) => s,
                    None => continue,
                },
            };
            segs.push((i, dist, raw));
        }
        if segs.is_empty() {
            return None;
        }

        let m = self.steps.len();
        let full = segs.len() == m;
        // Group into runs of loop-adjacent edges.
        let mut runs: Vec<Vec<usize>> = Vec::new();
        for (k, (pos, _, _)) in segs.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.last().is_some_and(|&l| segs[l].0 + 1 == *pos) => run.push(k),
                _ => runs.push(vec![k]),
            }
        }
        // Wrap-around: last run continues into the first.
        if !full && runs.len() > 1 && segs[0].0 == 0 && segs[segs.len() - 1].0 == m - 1 {
            let first = runs.remove(0);
            if let Some(last) = runs.last_mut() {
                last.extend(first);
            }
        }

        let corner = |pos: usize| -> Vec2 {
            // Node between loop step `pos` and the next one.
            self.graph
                .step_geom(self.steps[pos])
                .map_or(Vec2::ZERO, |g| g.end())
        };
        let mut chains: Vec<(Vec<Vec2>, bool)> = Vec::new();
        for run in &runs {
            let mut parts: Vec<Vec<Vec2>> = run.iter().map(|&k| segs[k].2.clone()).collect();
            let n = parts.len();
            let junctions = if full { n } else { n.saturating_sub(1) };
            for j in 0..junctions {
                let (ka, kb) = (run[j], run[(j + 1) % n]);
                let limit = opts.miter_limit * segs[ka].1.max(segs[kb].1);
                let c = corner(segs[ka].0);
                join(&mut parts, j, (j + 1) % n, c, limit);
            }
            let mut pts: Vec<Vec2> = parts.into_iter().flatten().collect();
            dedupe_consecutive(&mut pts);
            if full && pts.len() > 1 && pts[0].distance(pts[pts.len() - 1]) < EPS_POS {
                pts.pop();
            }
            chains.push((pts, full));
        }

        let base = self.graph.figure();
        let mut seam = Figure::new(
            seam_id.map_or_else(|| ids.next_id("seam"), str::to_string),
            Tool::Polyline,
        );
        seam.x = base.x;
        seam.y = base.y;
        seam.rotation = base.rotation;
        seam.closed = full;
        seam.role = FigureRole::Seam {
            parent_id: base.id.clone(),
        };
        seam.dashed = true;
        for (pts, closed) in &chains {
            let first_node = seam.nodes.len();
            for p in pts {
                seam.nodes.push(Node::new(ids.next_id("n"), p.x, p.y));
            }
            let count = seam.nodes.len() - first_node;
            for i in 1..count {
                let (a, b) = (&seam.nodes[first_node + i - 1], &seam.nodes[first_node + i]);
                seam.edges
                    .push(Edge::line(ids.next_id("e"), a.id.clone(), b.id.clone()));
            }
            if *closed && count >= 3 {
                let (a, b) = (&seam.nodes[seam.nodes.len() - 1], &seam.nodes[first_node]);
                seam.edges
                    .push(Edge::line(ids.next_id("e"), a.id.clone(), b.id.clone()));
            }
        }
        seam.seam_segment_edge_ids = segs
            .iter()
            .map(|(pos, _, _)| self.edge_id(&self.steps[*pos]).to_string())
            .collect();
        seam.seam_segments = segs.into_iter().map(|(_, _, s)| s).collect();
        seam.offset_cm = Some(spec);
        Some(seam)
    }
}

/// Joins the end of `parts[a]` to the start of `parts[b]` around the
/// original vertex `corner`: shared point, miter within `limit`, else bevel.
fn join(parts: &mut [Vec<Vec2>], a: usize, b: usize, corner: Vec2, limit: f64) {
    let (Some(&pa1), Some(&qb0)) = (parts[a].last(), parts[b].first()) else {
        return;
    };
    if pa1.distance(qb0) < EPS_POS {
        return;
    }
    let la = parts[a].len();
    if la < 2 || parts[b].len() < 2 {
        return;
    }
    let pa0 = parts[a][la - 2];
    let qb1 = parts[b][1];
    let Some(m) = intersect_lines(pa0, pa1, qb0, qb1) else {
        return;
    };
    if m.distance(corner) > limit {
        return; // bevel
    }
    parts[a][la - 1] = m;
    parts[b][0] = m;
}
