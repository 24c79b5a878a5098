//! Dart (pence) insertion: splices a triangular notch into a line, one side
//! of a rectangle, an arbitrary polyline, or an edge of a figure graph.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{
    flatten::{mean_point, point_in_polygon, polygon_area},
    path_length::{point_at_ratio, polyline_length},
    tolerance::{clamp01, EPS_AREA, EPS_POS},
};
use crate::graph::{EdgeGeom, FigureGraph};
use crate::ids::IdSource;
use crate::model::{Dart, Edge, EdgeKind, Figure, Node, Pique, Vec2};

/// What the dart is inserted into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DartTarget {
    Line {
        a: Vec2,
        b: Vec2,
    },
    #[serde(rename_all = "camelCase")]
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        /// 0 top, 1 right, 2 bottom, 3 left.
        edge_index: usize,
    },
    Polyline {
        points: Vec<Vec2>,
        closed: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DartShape {
    pub points: Vec<Vec2>,
    pub closed: bool,
    pub left: Vec2,
    pub apex: Vec2,
    pub right: Vec2,
    /// Index of `left` in `points`.
    pub insert_at: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DartParams {
    pub position_ratio: f64,
    pub depth_cm: f64,
    pub opening_cm: f64,
}

fn params_ok(ratio: f64, depth: f64, opening: f64) -> bool {
    ratio.is_finite() && depth.is_finite() && depth > 0.0 && opening.is_finite() && opening > 0.0
}

/// Distance kept between a base point and the end of its host edge.
const END_MARGIN: f64 = EPS_POS * 10.0;

/// Arc position of the dart centre on a host of length `len`, moved inward
/// so both base points stay on the host. `None` when the opening does not fit.
fn centre_on_host(s: f64, len: f64, opening: f64) -> Option<f64> {
    let lo = opening * 0.5 + END_MARGIN;
    let hi = len - lo;
    if hi < lo {
        return None;
    }
    Some(s.clamp(lo, hi))
}

/// Base points and apex of a dart centred on `center` along unit `tangent`.
fn dart_triangle(center: Vec2, tangent: Vec2, inward: Vec2, depth: f64, opening: f64) -> (Vec2, Vec2, Vec2) {
    let half = tangent * (opening * 0.5);
    (center - half, center + inward * depth, center + half)
}

/// Inserts a dart into `target`. `None` leaves the target unchanged
/// (degenerate edge, bad parameters, opening wider than the edge).
pub fn insert_dart(
    target: &DartTarget,
    position_ratio: f64,
    depth_px: f64,
    opening_px: f64,
) -> Option<DartShape> {
    if !params_ok(position_ratio, depth_px, opening_px) {
        return None;
    }
    let ratio = clamp01(position_ratio);
    match target {
        DartTarget::Line { a, b } => {
            let len = a.distance(*b);
            if len < EPS_POS {
                return None;
            }
            let s = centre_on_host(ratio * len, len, opening_px)?;
            let tangent = (*b - *a).normalize();
            let center = a.lerp(*b, s / len);
            let (left, apex, right) =
                dart_triangle(center, tangent, tangent.perp(), depth_px, opening_px);
            Some(DartShape {
                points: vec![*a, left, apex, right, *b],
                closed: false,
                left,
                apex,
                right,
                insert_at: 1,
            })
        }
        DartTarget::Rect {
            x,
            y,
            width,
            height,
            edge_index,
        } => {
            if *edge_index > 3 {
                return None;
            }
            let corners = [
                Vec2::new(*x, *y),
                Vec2::new(x + width, *y),
                Vec2::new(x + width, y + height),
                Vec2::new(*x, y + height),
            ];
            let (a, b) = (corners[*edge_index], corners[(*edge_index + 1) % 4]);
            let len = a.distance(b);
            if len < EPS_POS {
                return None;
            }
            let s = centre_on_host(ratio * len, len, opening_px)?;
            let tangent = (b - a).normalize();
            let center = a.lerp(b, s / len);
            let rect_center = Vec2::new(x + width * 0.5, y + height * 0.5);
            let mut inward = tangent.perp();
            if (rect_center - center).dot(inward) < 0.0 {
                inward = -inward;
            }
            let (left, apex, right) = dart_triangle(center, tangent, inward, depth_px, opening_px);
            let mut points = corners.to_vec();
            let at = *edge_index + 1;
            points.splice(at..at, [left, apex, right]);
            Some(DartShape {
                points,
                closed: true,
                left,
                apex,
                right,
                insert_at: at,
            })
        }
        DartTarget::Polyline { points, closed } => {
            let min = if *closed { 3 } else { 2 };
            if points.len() < min {
                return None;
            }
            let mut path = points.clone();
            if *closed {
                path.push(points[0]);
            }
            if polyline_length(&path) < EPS_POS {
                return None;
            }
            let at = point_at_ratio(&path, ratio)?;
            let seg_start = path[at.segment];
            let seg_len = seg_start.distance(path[at.segment + 1]);
            let Some(local) = centre_on_host(seg_start.distance(at.pos), seg_len, opening_px) else {
                debug!(seg_len, opening_px, "dart opening wider than host segment");
                return None;
            };
            let center = seg_start + at.tangent * local;
            let inward = polyline_inward(points, *closed, center, at.tangent);
            let (left, apex, right) =
                dart_triangle(center, at.tangent, inward, depth_px, opening_px);
            let mut out = points.clone();
            let insert_at = at.segment + 1;
            out.splice(insert_at..insert_at, [left, apex, right]);
            Some(DartShape {
                points: out,
                closed: *closed,
                left,
                apex,
                right,
                insert_at,
            })
        }
    }
}

/// Closed shapes: toward the interior (winding, verified by a probe).
/// Open shapes: toward the side holding the bulk of the points.
fn polyline_inward(points: &[Vec2], closed: bool, at: Vec2, tangent: Vec2) -> Vec2 {
    let left = tangent.perp();
    if closed {
        let area = polygon_area(points);
        if area.abs() > EPS_AREA {
            let mut inward = if area > 0.0 { left } else { -left };
            if !point_in_polygon(at + inward * 0.5, points) {
                inward = -inward;
            }
            return inward;
        }
    }
    let side = (mean_point(points) - at).dot(left);
    if side < -EPS_POS {
        -left
    } else {
        left
    }
}

/// Inward direction for a figure edge point: interior of the outer loop for
/// closed figures, otherwise toward the figure centroid.
fn figure_inward(graph: &FigureGraph, samples: usize, at: Vec2, tangent: Vec2) -> Vec2 {
    let fig = graph.figure();
    let pts = graph.flatten(samples);
    polyline_inward(&pts, fig.closed && pts.len() >= 3, at, tangent)
}

/// Splices a dart into graph edge `edge_id`: three new nodes (left base,
/// apex, right base) and the host edge split into four edges. The host
/// edge's id stays on the piece leading to the left base.
pub fn insert_dart_into_figure(
    figure: &Figure,
    edge_id: &str,
    params: DartParams,
    px_per_cm: f64,
    samples: usize,
    ids: &mut dyn IdSource,
) -> Option<Figure> {
    let depth = params.depth_cm * px_per_cm;
    let opening = params.opening_cm * px_per_cm;
    if !params_ok(params.position_ratio, depth, opening) {
        return None;
    }
    let graph = FigureGraph::new(figure);
    let idx = graph.edge_index(edge_id)?;
    let host = graph.edge(idx)?.clone();
    let geom = graph.edge_geom(idx)?;
    if geom.is_degenerate() {
        debug!(figure = %figure.id, edge = edge_id, "dart on degenerate edge ignored");
        return None;
    }
    let len = geom.length(samples);
    let s = centre_on_host(clamp01(params.position_ratio) * len, len, opening)?;
    let ratio = s / len;
    let (s_left, s_right) = (s - opening * 0.5, s + opening * 0.5);

    let mut out = figure.clone();
    let left_id = ids.next_id("n");
    let apex_id = ids.next_id("n");
    let right_id = ids.next_id("n");
    let mut left_node;
    let mut right_node;
    let apex;
    match geom {
        EdgeGeom::Line { a, b } => {
            let tangent = (b - a).normalize();
            let center = a.lerp(b, ratio);
            let inward = figure_inward(&graph, samples, center, tangent);
            let (l, ap, r) = dart_triangle(center, tangent, inward, depth, opening);
            left_node = Node::new(left_id.clone(), l.x, l.y);
            right_node = Node::new(right_id.clone(), r.x, r.y);
            apex = ap;
        }
        EdgeGeom::Cubic(c) => {
            let t_mid = c.parameter_at_length(s, samples);
            let t_l = c.parameter_at_length(s_left, samples);
            let t_r = c.parameter_at_length(s_right, samples);
            let center = c.eval(t_mid);
            let tangent = c.direction(t_mid);
            let inward = figure_inward(&graph, samples, center, tangent);
            apex = center + inward * depth;
            let head = c.subcurve(0.0, t_l);
            let tail = c.subcurve(t_r, 1.0);
            left_node = Node::new(left_id.clone(), head.p3.x, head.p3.y);
            left_node.in_handle = Some(head.p2);
            right_node = Node::new(right_id.clone(), tail.p0.x, tail.p0.y);
            right_node.out_handle = Some(tail.p1);
            for n in out.nodes.iter_mut() {
                if n.id == host.from {
                    n.out_handle = Some(head.p1);
                }
                if n.id == host.to {
                    n.in_handle = Some(tail.p2);
                }
            }
        }
    }
    let apex_node = Node::new(apex_id.clone(), apex.x, apex.y);
    out.nodes.extend([left_node, apex_node, right_node]);

    let tail_edge_id = ids.next_id("e");
    let pieces = [
        Edge {
            id: host.id.clone(),
            from: host.from.clone(),
            to: left_id.clone(),
            kind: host.kind,
        },
        Edge::line(ids.next_id("e"), left_id.clone(), apex_id.clone()),
        Edge::line(ids.next_id("e"), apex_id.clone(), right_id.clone()),
        Edge {
            id: tail_edge_id.clone(),
            from: right_id.clone(),
            to: host.to.clone(),
            kind: host.kind,
        },
    ];
    out.edges.splice(idx..idx + 1, pieces);

    // Notches on the host edge move to the piece they now lie on; those
    // inside the dart opening are dropped.
    out.piques = figure
        .piques
        .iter()
        .filter_map(|p| {
            if p.edge_id != host.id {
                return Some(p.clone());
            }
            let d = p.t01 * len;
            if d <= s_left {
                Some(Pique {
                    t01: d / s_left,
                    ..p.clone()
                })
            } else if d >= s_right {
                Some(Pique {
                    edge_id: tail_edge_id.clone(),
                    t01: (d - s_right) / (len - s_right),
                    ..p.clone()
                })
            } else {
                None
            }
        })
        .collect();
    out.darts.push(Dart {
        a_node_id: left_id,
        b_node_id: right_id,
        c_node_id: apex_id,
        depth_cm: params.depth_cm,
        opening_cm: params.opening_cm,
        position_ratio: ratio,
    });
    Some(out)
}

/// Moves the nodes of dart `index` to new parameters. Only darts on straight
/// host edges can be re-placed; the host is the line between the node leading
/// into the left base and the node following the right base.
pub fn update_dart(
    figure: &Figure,
    index: usize,
    params: DartParams,
    px_per_cm: f64,
) -> Option<Figure> {
    let depth = params.depth_cm * px_per_cm;
    let opening = params.opening_cm * px_per_cm;
    if !params_ok(params.position_ratio, depth, opening) {
        return None;
    }
    let dart = figure.darts.get(index)?;
    let into_left = figure.edges.iter().find(|e| {
        e.touches(&dart.a_node_id) && !e.touches(&dart.c_node_id) && e.kind == EdgeKind::Line
    })?;
    let out_of_right = figure.edges.iter().find(|e| {
        e.touches(&dart.b_node_id) && !e.touches(&dart.c_node_id) && e.kind == EdgeKind::Line
    })?;
    let a = figure.node_pos(into_left.other(&dart.a_node_id)?)?;
    let b = figure.node_pos(out_of_right.other(&dart.b_node_id)?)?;
    let old_apex = figure.node_pos(&dart.c_node_id)?;
    let len = a.distance(b);
    if len < EPS_POS {
        return None;
    }
    let ratio = centre_on_host(clamp01(params.position_ratio) * len, len, opening)? / len;
    let tangent = (b - a).normalize();
    let center = a.lerp(b, ratio);
    // Keep the side the apex is currently on.
    let mut inward = tangent.perp();
    if (old_apex - center).dot(inward) < 0.0 {
        inward = -inward;
    }
    let (l, ap, r) = dart_triangle(center, tangent, inward, depth, opening);
    let mut out = figure.clone();
    for n in out.nodes.iter_mut() {
        let p = if n.id == dart.a_node_id {
            l
        } else if n.id == dart.b_node_id {
            r
        } else if n.id == dart.c_node_id {
            ap
        } else {
            continue;
        };
        n.x = p.x;
        n.y = p.y;
    }
    out.darts[index] = Dart {
        depth_cm: params.depth_cm,
        opening_cm: params.opening_cm,
        position_ratio: ratio,
        ..dart.clone()
    };
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::math::dist_point_to_seg;

    #[test]
    fn line_dart_geometry() {
        let t = DartTarget::Line {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(100.0, 0.0),
        };
        let d = insert_dart(&t, 0.5, 30.0, 12.0).unwrap();
        assert_eq!(d.points.len(), 5);
        assert!((d.left.distance(d.right) - 12.0).abs() < 0.1);
        assert!((dist_point_to_seg(d.apex, Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)) - 30.0).abs() < 0.1);
        assert_eq!(d.points[0], Vec2::new(0.0, 0.0));
        assert_eq!(d.points[4], Vec2::new(100.0, 0.0));
        assert!(d.left.x < d.right.x);
    }

    #[test]
    fn degenerate_line_is_noop() {
        let t = DartTarget::Line {
            a: Vec2::new(5.0, 5.0),
            b: Vec2::new(5.0, 5.00001),
        };
        assert!(insert_dart(&t, 0.5, 10.0, 4.0).is_none());
        let ok = DartTarget::Line { a: Vec2::ZERO, b: Vec2::new(10.0, 0.0) };
        assert!(insert_dart(&ok, 0.5, -1.0, 4.0).is_none());
    }

    #[test]
    fn rect_dart_points_inward() {
        for edge_index in 0..4 {
            let t = DartTarget::Rect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 60.0,
                edge_index,
            };
            let d = insert_dart(&t, 0.5, 20.0, 10.0).unwrap();
            assert_eq!(d.points.len(), 7);
            assert!(d.closed);
            assert!(d.apex.x > 0.0 && d.apex.x < 100.0 && d.apex.y > 0.0 && d.apex.y < 60.0);
            assert_eq!(d.points[d.insert_at + 1], d.apex);
        }
    }

    #[test]
    fn closed_polyline_dart_goes_inside() {
        let sq = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 100.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 0.0),
        ];
        let t = DartTarget::Polyline { points: sq.clone(), closed: true };
        // 0.875 of the perimeter lies on the closing segment.
        let d = insert_dart(&t, 0.875, 25.0, 10.0).unwrap();
        assert_eq!(d.points.len(), 7);
        assert_eq!(d.insert_at, 4);
        assert!(point_in_polygon(d.apex, &sq));
    }
}
