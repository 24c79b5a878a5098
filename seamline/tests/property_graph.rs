//! Random figure graphs: every operation stays total and well-formed.

use proptest::prelude::*;
use std::collections::HashSet;

use seamline::{
    compute_offset, get_all_snap_points, trace_outer_boundary, Edge, EdgeKind, Figure, Node, OffsetSelector,
    SequentialIds, Tool, Vec2,
};

#[derive(Clone, Debug)]
struct RawGraph {
    nodes: Vec<(i16, i16)>,
    edges: Vec<(u8, u8, bool)>,
}

fn raw_graph() -> impl Strategy<Value = RawGraph> {
    (
        prop::collection::vec((-200i16..200, -200i16..200), 1..12),
        prop::collection::vec((any::<u8>(), any::<u8>(), any::<bool>()), 0..24),
    )
        .prop_map(|(nodes, edges)| RawGraph { nodes, edges })
}

fn build(raw: &RawGraph) -> Figure {
    let mut f = Figure::new("g", Tool::Pen);
    f.closed = true;
    // Distinct positions only, so no edge between two nodes is degenerate.
    let mut seen = HashSet::new();
    let unique: Vec<(i16, i16)> = raw.nodes.iter().copied().filter(|p| seen.insert(*p)).collect();
    for (i, (x, y)) in unique.iter().enumerate() {
        let mut n = Node::new(format!("n{i}"), f64::from(*x), f64::from(*y));
        n.out_handle = Some(Vec2::new(f64::from(*x) + 15.0, f64::from(*y) - 10.0));
        n.in_handle = Some(Vec2::new(f64::from(*x) - 15.0, f64::from(*y) + 10.0));
        f.nodes.push(n);
    }
    let n = unique.len();
    for (k, (a, b, cubic)) in raw.edges.iter().enumerate() {
        let mut e = Edge::line(
            format!("e{k}"),
            format!("n{}", *a as usize % n),
            format!("n{}", *b as usize % n),
        );
        if *cubic {
            e.kind = EdgeKind::Cubic;
        }
        f.edges.push(e);
    }
    f
}

proptest! {
    #[test]
    fn traced_loops_are_closed_walks(raw in raw_graph()) {
        let f = build(&raw);
        if let Some(ob) = trace_outer_boundary(&f) {
            prop_assert!(ob.edge_ids.len() >= 3);
            prop_assert_eq!(ob.node_ids.len(), ob.edge_ids.len() + 1);
            prop_assert_eq!(ob.node_ids.first(), ob.node_ids.last());
            let mut used = HashSet::new();
            for (k, id) in ob.edge_ids.iter().enumerate() {
                let e = f.edge(id).unwrap();
                let (a, b) = (&ob.node_ids[k], &ob.node_ids[k + 1]);
                prop_assert!(
                    (&e.from == a && &e.to == b) || (&e.from == b && &e.to == a),
                    "edge {} does not join {} and {}", id, a, b
                );
                used.insert((id.clone(), a.clone()));
            }
            prop_assert_eq!(used.len(), ob.edge_ids.len());
        }
    }

    #[test]
    fn offsets_and_snaps_stay_finite(raw in raw_graph(), value in 0.1f64..3.0) {
        let f = build(&raw);
        let mut ids = SequentialIds::starting_at(1000);
        if let Some(seam) = compute_offset(&f, &OffsetSelector::Whole, value, 10.0, &mut ids) {
            prop_assert!(seam.nodes.iter().all(|n| n.pos().is_finite()));
            prop_assert_eq!(seam.seam_segments.len(), seam.seam_segment_edge_ids.len());
        }
        let other = Figure::from_points(
            "o",
            Tool::Line,
            &[Vec2::new(-250.0, 0.0), Vec2::new(250.0, 0.0)],
            false,
            &mut ids,
        );
        let pts = get_all_snap_points(&[f, other], None, 8);
        prop_assert!(pts.iter().all(|p| p.pos.is_finite()));
    }
}
