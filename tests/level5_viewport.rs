//! Level 5: Viewport Tests
//!
//! Tests zoom-to-cursor, panning, node dragging, gesture exclusivity and
//! edges following dragged nodes.

mod common;

use common::assert_close;
use common::harness::WorkspaceHarness;
use slint_annotation_graph::{
    find_edge_at, EditorConfig, Gesture, HighlightColor, LabelAnchor, RadialLayoutConfig, ViewportConfig,
    ViewportInteraction, ViewportTransform,
};

/// Two connected annotations: `a` is main at the origin, `b` sits at (350, 0).
fn connected() -> (WorkspaceHarness, slint_annotation_graph::AnnotationId, slint_annotation_graph::AnnotationId) {
    let mut harness = WorkspaceHarness::new();
    let a = harness.highlight(0, 5, HighlightColor::Pink);
    let b = harness.highlight(12, 15, HighlightColor::Blue);
    harness.connect(&a, &b, "relationship").unwrap();
    (harness, a, b)
}

#[test]
fn test_zoom_keeps_point_under_cursor() {
    let mut viewport = ViewportInteraction::new(ViewportConfig::default());
    viewport.set_transform(ViewportTransform::new(0.8, 500.0, 400.0));

    for (cx, cy, delta) in [(123.0, 456.0, -1.0), (800.0, 20.0, 3.0), (0.0, 0.0, -120.0)] {
        let before = viewport.transform().screen_to_graph(cx, cy);
        assert!(viewport.wheel(cx, cy, delta));
        let after = viewport.transform().screen_to_graph(cx, cy);
        assert_close(before.0, after.0);
        assert_close(before.1, after.1);
    }
}

#[test]
fn test_zoom_direction_and_clamp() {
    let mut viewport = ViewportInteraction::new(ViewportConfig::default());
    assert!(viewport.wheel(0.0, 0.0, -1.0));
    assert_close(viewport.transform().scale, 1.1);
    assert!(viewport.wheel(0.0, 0.0, 1.0));
    assert_close(viewport.transform().scale, 1.0);

    for _ in 0..50 {
        viewport.wheel(0.0, 0.0, -1.0);
    }
    assert_eq!(viewport.transform().scale, 3.0);
    assert!(!viewport.wheel(0.0, 0.0, -1.0));

    for _ in 0..100 {
        viewport.wheel(0.0, 0.0, 1.0);
    }
    assert_eq!(viewport.transform().scale, 0.1);
}

#[test]
fn test_inverted_scale_ranges_do_not_panic() {
    let config = EditorConfig {
        viewport: ViewportConfig {
            zoom_factor: 1.1,
            min_scale: 4.0,
            max_scale: 2.0,
        },
        layout: RadialLayoutConfig {
            min_fit_scale: 2.0,
            max_fit_scale: 0.5,
            ..RadialLayoutConfig::default()
        },
        ..EditorConfig::default()
    };
    let mut harness = WorkspaceHarness::with_config(config);
    harness.highlight(0, 5, HighlightColor::Pink);
    harness.ws.set_container_size(1000.0, 800.0);
    assert_eq!(harness.ws.viewport().transform().scale, 0.5);

    assert!(harness.ws.graph_wheel(10.0, 10.0, -1.0));
    assert_eq!(harness.ws.viewport().transform().scale, 2.0);
}

#[test]
fn test_background_drag_pans() {
    let (mut harness, _, _) = connected();
    assert_eq!(harness.ws.graph_pointer_down(1000.0, 1000.0), None);
    assert!(harness.ws.viewport().is_panning());
    assert!(harness.ws.graph_pointer_move(1050.0, 980.0));
    let transform = harness.ws.viewport().transform();
    assert_eq!((transform.translate_x, transform.translate_y), (50.0, -20.0));
    harness.ws.graph_pointer_up();
    assert_eq!(harness.ws.viewport().gesture(), &Gesture::Idle);
}

#[test]
fn test_node_drag_keeps_grab_offset() {
    let (mut harness, _, b) = connected();
    assert_eq!(harness.ws.graph_pointer_down(360.0, 5.0), Some(b.clone()));
    assert!(harness.ws.graph_pointer_move(400.0, 100.0));

    let node = harness.ws.layout().node(&b).unwrap();
    assert_close(node.x, 390.0);
    assert_close(node.y, 95.0);
    // Dragging never pans
    assert_eq!(harness.ws.viewport().transform(), ViewportTransform::default());
}

#[test]
fn test_drag_respects_zoom() {
    let (mut harness, _, b) = connected();
    harness.ws.set_container_size(1000.0, 800.0);
    let t = harness.ws.viewport().transform();
    let (sx, sy) = t.graph_to_screen(350.0, 0.0);

    assert_eq!(harness.ws.graph_pointer_down(sx, sy), Some(b.clone()));
    harness.ws.graph_pointer_move(sx + t.scale * 100.0, sy);
    let node = harness.ws.layout().node(&b).unwrap();
    assert_close(node.x, 450.0);
    assert_close(node.y, 0.0);
}

#[test]
fn test_pointer_leave_ends_gesture() {
    let (mut harness, _, b) = connected();
    harness.ws.graph_pointer_down(350.0, 0.0);
    harness.ws.graph_pointer_leave();
    assert!(!harness.ws.graph_pointer_move(500.0, 500.0));
    let node = harness.ws.layout().node(&b).unwrap();
    assert_eq!((node.x, node.y), (350.0, 0.0));
}

#[test]
fn test_edges_follow_dragged_node() {
    let (mut harness, _, _) = connected();
    let edges = harness.ws.edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].label, "relationship");
    assert_eq!(edges[0].start, (0.0, 0.0));
    assert_eq!(edges[0].label_anchor, LabelAnchor::Middle);
    let before = edges[0].end;

    // Drag b straight below a: the edge becomes vertical-ish
    harness.ws.graph_pointer_down(350.0, 0.0);
    harness.ws.graph_pointer_move(0.0, 400.0);
    harness.ws.graph_pointer_up();

    let edges = harness.ws.edges();
    assert_eq!(edges[0].start, (0.0, 0.0));
    assert_ne!(edges[0].end, before);
    assert_eq!(edges[0].label_anchor, LabelAnchor::Start);
    assert!(edges[0].line_commands().starts_with("M 0 0 L "));
}

#[test]
fn test_edge_hit_testing() {
    let (harness, _, _) = connected();
    let edges = harness.ws.edges();
    let hit = find_edge_at(150.0, 3.0, &edges, 5.0);
    assert_eq!(hit, Some(&harness.ws.connections()[0].id));
    assert!(find_edge_at(150.0, 50.0, &edges, 5.0).is_none());
}
