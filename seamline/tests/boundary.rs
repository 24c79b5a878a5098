//! Outer loop tracing on closed, self-touching and branched figures.

use std::collections::HashSet;

use seamline::{trace_outer_boundary, Edge, EdgeKind, Figure, Node, Tool, Vec2};

fn figure(nodes: &[(&str, f64, f64)], edges: &[(&str, &str, &str)], closed: bool) -> Figure {
    let mut f = Figure::new("fig", Tool::Pen);
    f.closed = closed;
    f.nodes = nodes.iter().map(|(id, x, y)| Node::new(*id, *x, *y)).collect();
    f.edges = edges.iter().map(|(id, a, b)| Edge::line(*id, *a, *b)).collect();
    f
}

#[test]
fn rectangle_loop_has_four_edges_and_repeats_start() {
    let f = figure(
        &[("a", 0.0, 0.0), ("b", 120.0, 0.0), ("c", 120.0, 80.0), ("d", 0.0, 80.0)],
        &[("ab", "a", "b"), ("bc", "b", "c"), ("cd", "c", "d"), ("da", "d", "a")],
        true,
    );
    let ob = trace_outer_boundary(&f).expect("closed rectangle traces");
    assert_eq!(ob.edge_ids.len(), 4);
    assert_eq!(ob.node_ids.len(), 5);
    assert_eq!(ob.node_ids.first(), ob.node_ids.last());
    let distinct: HashSet<&String> = ob.node_ids.iter().collect();
    assert_eq!(distinct.len(), 4);
}

#[test]
fn self_touching_squares_visit_shared_corner_twice() {
    // Two squares meeting only at node "s".
    let f = figure(
        &[
            ("a", 0.0, 0.0),
            ("b", 100.0, 0.0),
            ("s", 100.0, 100.0),
            ("d", 0.0, 100.0),
            ("e", 200.0, 100.0),
            ("g", 200.0, 200.0),
            ("h", 100.0, 200.0),
        ],
        &[
            ("ab", "a", "b"),
            ("bs", "b", "s"),
            ("sd", "s", "d"),
            ("da", "d", "a"),
            ("se", "s", "e"),
            ("eg", "e", "g"),
            ("gh", "g", "h"),
            ("hs", "h", "s"),
        ],
        true,
    );
    let ob = trace_outer_boundary(&f).expect("figure eight traces");
    assert_eq!(ob.edge_ids.len(), 8);
    let distinct: HashSet<&String> = ob.edge_ids.iter().collect();
    assert_eq!(distinct.len(), 8);
    // Closing repetition of the start node excluded.
    let visits = ob.node_ids[..ob.node_ids.len() - 1]
        .iter()
        .filter(|id| id.as_str() == "s")
        .count();
    assert_eq!(visits, 2);
}

#[test]
fn hole_and_branch_edges_are_not_part_of_the_loop() {
    let f = figure(
        &[
            ("o1", 100.0, 100.0),
            ("o2", 400.0, 100.0),
            ("o3", 400.0, 400.0),
            ("o4", 100.0, 400.0),
            ("i1", 200.0, 200.0),
            ("i2", 300.0, 200.0),
            ("i3", 300.0, 300.0),
            ("i4", 200.0, 300.0),
            ("t", 250.0, 150.0),
        ],
        &[
            ("o12", "o1", "o2"),
            ("o23", "o2", "o3"),
            ("o34", "o3", "o4"),
            ("o41", "o4", "o1"),
            ("i12", "i1", "i2"),
            ("i23", "i2", "i3"),
            ("i34", "i3", "i4"),
            ("i41", "i4", "i1"),
            ("branch", "o1", "t"),
        ],
        true,
    );
    let ob = trace_outer_boundary(&f).unwrap();
    let mut got = ob.edge_ids.clone();
    got.sort();
    assert_eq!(got, vec!["o12", "o23", "o34", "o41"]);
}

#[test]
fn cubic_edges_trace_like_lines() {
    let mut f = figure(
        &[("a", 0.0, 0.0), ("b", 100.0, 0.0), ("c", 50.0, 80.0)],
        &[("ab", "a", "b"), ("bc", "b", "c"), ("ca", "c", "a")],
        true,
    );
    // Bulge the bottom edge outward (up, away from c).
    f.edges[0].kind = EdgeKind::Cubic;
    f.nodes[0].out_handle = Some(Vec2::new(30.0, -40.0));
    f.nodes[1].in_handle = Some(Vec2::new(70.0, -40.0));
    let ob = trace_outer_boundary(&f).unwrap();
    assert_eq!(ob.edge_ids.len(), 3);
}

#[test]
fn unsupported_inputs_yield_none() {
    let open = figure(
        &[("a", 0.0, 0.0), ("b", 10.0, 0.0), ("c", 10.0, 10.0)],
        &[("ab", "a", "b"), ("bc", "b", "c")],
        false,
    );
    assert!(trace_outer_boundary(&open).is_none());

    let empty = figure(&[], &[], true);
    assert!(trace_outer_boundary(&empty).is_none());

    let dangling = figure(&[("a", 0.0, 0.0)], &[("ax", "a", "x")], true);
    assert!(trace_outer_boundary(&dangling).is_none());
}
