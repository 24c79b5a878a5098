//! Magnet join: merging a dragged stroke into another figure.

use seamline::{
    add_pique, compute_offset, get_all_snap_points, magnet_join, split_edge_at, Figure, OffsetSelector, SnapKind,
    SequentialIds, Tool, Vec2,
};

fn square(ids: &mut SequentialIds) -> Figure {
    Figure::from_points(
        "sq",
        Tool::Rectangle,
        &[
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(0.0, 100.0),
        ],
        true,
        ids,
    )
}

#[test]
fn endpoint_dropped_on_a_midpoint_splits_the_edge() {
    let mut ids = SequentialIds::new();
    let sq = square(&mut ids);
    let line = Figure::from_points(
        "line",
        Tool::Line,
        &[Vec2::new(160.0, -80.0), Vec2::new(100.0, 50.0)],
        false,
        &mut ids,
    );
    let figs = vec![sq.clone(), line.clone()];
    let snaps = get_all_snap_points(&figs, Some("line"), 16);
    let right_mid = snaps
        .iter()
        .find(|s| s.kind == SnapKind::Midpoint && s.pos.distance(Vec2::new(100.0, 50.0)) < 1e-9)
        .unwrap();
    let moving = line.nodes[1].id.clone();
    let out = magnet_join(&figs, "line", &moving, right_mid, 16, &mut ids).unwrap();
    assert_eq!(out.len(), 1);
    let m = &out[0];
    assert_eq!(m.edges.len(), sq.edges.len() + line.edges.len() + 1);
    // The dragged endpoint becomes the split node instead of sitting on top of it.
    assert_eq!(m.nodes.len(), sq.nodes.len() + line.nodes.len());
    let shared: Vec<_> = m
        .nodes
        .iter()
        .filter(|n| n.pos().distance(Vec2::new(100.0, 50.0)) < 1e-9)
        .collect();
    assert_eq!(shared.len(), 1, "no duplicate coincident node");
    let touching = m.edges.iter().filter(|e| e.touches(&shared[0].id)).count();
    assert_eq!(touching, 3);
    // Every edge endpoint resolves to a node of the merged figure.
    assert!(m
        .edges
        .iter()
        .all(|e| m.node(&e.from).is_some() && m.node(&e.to).is_some()));
}

#[test]
fn rotated_stroke_is_expressed_in_the_target_frame() {
    let mut ids = SequentialIds::new();
    let mut sq = square(&mut ids);
    sq.x = 10.0;
    sq.y = 20.0;
    let mut stroke = Figure::from_points(
        "stroke",
        Tool::Line,
        &[Vec2::new(0.0, 0.0), Vec2::new(30.0, 0.0)],
        false,
        &mut ids,
    );
    stroke.x = 110.0;
    stroke.y = 120.0;
    stroke.rotation = 90.0;
    let far_world = stroke.to_world(stroke.nodes[1].pos());
    let figs = vec![sq.clone(), stroke.clone()];
    let corner = get_all_snap_points(&figs, Some("stroke"), 16)
        .into_iter()
        .find(|s| s.kind == SnapKind::Endpoint && s.pos.distance(Vec2::new(110.0, 120.0)) < 1e-9)
        .unwrap();
    let out = magnet_join(&figs, "stroke", &stroke.nodes[0].id, &corner, 16, &mut ids).unwrap();
    let m = &out[0];
    assert_eq!(m.nodes.len(), 5);
    let far = m.nodes.last().unwrap();
    assert!(m.to_world(far.pos()).distance(far_world) < 1e-9);
}

#[test]
fn crossing_join_splits_the_other_figure() {
    let mut ids = SequentialIds::new();
    let sq = square(&mut ids);
    let bar = Figure::from_points(
        "bar",
        Tool::Line,
        &[Vec2::new(50.0, 50.0), Vec2::new(50.0, 150.0)],
        false,
        &mut ids,
    );
    let figs = vec![sq.clone(), bar.clone()];
    let x = get_all_snap_points(&figs, None, 16)
        .into_iter()
        .find(|s| s.kind == SnapKind::Intersection)
        .unwrap();
    let out = magnet_join(&figs, "bar", &bar.nodes[0].id, &x, 16, &mut ids).unwrap();
    let m = &out[0];
    assert_eq!(m.id, "sq");
    assert_eq!(m.edges.len(), 6);
    assert!(m.nodes.iter().any(|n| n.pos().distance(Vec2::new(50.0, 100.0)) < 1e-9));
}

#[test]
fn seams_of_the_moving_figure_go_away() {
    let mut ids = SequentialIds::new();
    let sq = square(&mut ids);
    let tri = Figure::from_points(
        "tri",
        Tool::Polyline,
        &[Vec2::new(200.0, 0.0), Vec2::new(300.0, 0.0), Vec2::new(250.0, 80.0)],
        true,
        &mut ids,
    );
    let seam = compute_offset(&tri, &OffsetSelector::Whole, 1.0, 10.0, &mut ids).unwrap();
    let figs = vec![sq.clone(), tri.clone(), seam];
    let snap = get_all_snap_points(&figs, Some("tri"), 16)
        .into_iter()
        .find(|s| s.figure_id == "sq" && s.kind == SnapKind::Endpoint)
        .unwrap();
    let out = magnet_join(&figs, "tri", &tri.nodes[0].id, &snap, 16, &mut ids).unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn joining_onto_itself_is_rejected() {
    let mut ids = SequentialIds::new();
    let sq = square(&mut ids);
    let figs = vec![sq.clone()];
    let snap = get_all_snap_points(&figs, None, 16).remove(0);
    assert!(magnet_join(&figs, "sq", &sq.nodes[1].id, &snap, 16, &mut ids).is_none());
}

#[test]
fn split_moves_notches_onto_the_piece_they_lie_on() {
    let mut ids = SequentialIds::new();
    let sq = square(&mut ids);
    let top = sq.edges[0].id.clone();
    let right = sq.edges[1].id.clone();
    let sq = add_pique(&sq, &top, 0.2, 0.5, 1).unwrap();
    let sq = add_pique(&sq, &top, 0.8, 0.5, -1).unwrap();
    let sq = add_pique(&sq, &right, 0.3, 0.5, 1).unwrap();

    let (out, node) = split_edge_at(&sq, &top, 0.5, 16, &mut ids).unwrap();
    assert_eq!(out.node_pos(&node).unwrap(), Vec2::new(50.0, 0.0));
    let tail = out.edges[1].id.clone();
    assert_eq!(out.edges[1].from, node);
    assert_eq!(out.piques.len(), 3);

    let head_notch = &out.piques[0];
    assert_eq!(head_notch.edge_id, top);
    assert!((head_notch.t01 - 0.4).abs() < 1e-9);
    let tail_notch = &out.piques[1];
    assert_eq!(tail_notch.edge_id, tail);
    assert!((tail_notch.t01 - 0.6).abs() < 1e-9);
    assert_eq!(tail_notch.side, -1);
    // Notches on other edges are untouched.
    assert_eq!(out.piques[2], sq.piques[2]);
}

#[test]
fn split_at_an_endpoint_keeps_the_notches() {
    let mut ids = SequentialIds::new();
    let sq = square(&mut ids);
    let top = sq.edges[0].id.clone();
    let sq = add_pique(&sq, &top, 0.7, 0.5, 1).unwrap();
    let (out, node) = split_edge_at(&sq, &top, 1.0, 16, &mut ids).unwrap();
    assert_eq!(node, sq.edges[0].to);
    assert_eq!(out, sq);
}
