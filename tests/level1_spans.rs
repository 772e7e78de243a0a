//! Level 1: Span Model Tests
//!
//! Tests annotation creation rules, text partitioning and mapping rendered
//! selections back to logical offsets.

mod common;

use common::harness::WorkspaceHarness;
use common::{annotation, assert_tiles, bounds, TEXT};
use slint_annotation_graph::{
    logical_offset, partition, render_tree, selection_range, AnnotationError, AnnotationStyle,
    Boundary, EditorError, HighlightColor, SelectionRange, SymbolMark,
};

#[test]
fn test_plain_text_is_one_segment() {
    let harness = WorkspaceHarness::new();
    assert_eq!(harness.segment_bounds(), vec![(0, 16)]);
    assert!(harness.ws.segments()[0].is_plain());
}

#[test]
fn test_partition_adds_trailing_boundary() {
    let mut harness = WorkspaceHarness::new();
    harness.highlight(0, 5, HighlightColor::Pink);
    harness.symbol(12, 15, SymbolMark::Character);
    assert_eq!(harness.segment_bounds(), vec![(0, 5), (5, 12), (12, 15), (15, 16)]);
}

#[test]
fn test_partition_covers_text_exactly_once() {
    let anns = vec![
        annotation("a", 0, 5, TEXT),
        annotation("b", 6, 11, TEXT),
        annotation("c", 12, 16, TEXT),
    ];
    let segments = partition(TEXT, &anns);
    assert_tiles(&segments, 16);
    for seg in &segments {
        for ann in &seg.annotations {
            assert!(ann.start <= seg.start && seg.end <= ann.end);
        }
    }
}

#[test]
fn test_nested_annotations_ordered_narrowest_first() {
    let anns = vec![annotation("outer", 0, 11, TEXT), annotation("inner", 6, 11, TEXT)];
    let segments = partition(TEXT, &anns);
    assert_eq!(bounds(&segments), vec![(0, 6), (6, 11), (11, 16)]);
    let ids: Vec<&str> = segments[1].annotations.iter().map(|ann| ann.id.as_str()).collect();
    assert_eq!(ids, vec!["inner", "outer"]);
}

#[test]
fn test_strict_rejects_identical_range() {
    let mut harness = WorkspaceHarness::strict();
    harness.highlight(0, 5, HighlightColor::Pink);
    let err = harness
        .ws
        .add_annotation(AnnotationStyle::Highlight(HighlightColor::Blue), SelectionRange::new(0, 5))
        .unwrap_err();
    assert!(matches!(err, EditorError::Annotation(AnnotationError::Overlap(_))));
    assert_eq!(harness.ws.annotations().len(), 1);
    assert_eq!(harness.ws.notices().len(), 1);
}

#[test]
fn test_nested_accepts_identical_range() {
    let mut harness = WorkspaceHarness::new();
    harness.highlight(0, 5, HighlightColor::Pink);
    harness.highlight(0, 5, HighlightColor::Blue);
    assert_eq!(harness.ws.annotations().len(), 2);
    assert_eq!(harness.ws.segments()[0].annotations.len(), 2);
}

#[test]
fn test_annotations_stay_sorted_by_start() {
    let mut harness = WorkspaceHarness::new();
    harness.symbol(12, 15, SymbolMark::Question);
    harness.highlight(0, 5, HighlightColor::Green);
    harness.highlight(6, 11, HighlightColor::Yellow);
    let starts: Vec<usize> = harness.ws.annotations().iter().map(|ann| ann.start).collect();
    assert_eq!(starts, vec![0, 6, 12]);
}

#[test]
fn test_range_past_end_rejected() {
    let mut harness = WorkspaceHarness::new();
    let err = harness
        .ws
        .add_annotation(AnnotationStyle::Highlight(HighlightColor::Pink), SelectionRange::new(10, 20))
        .unwrap_err();
    assert!(matches!(
        err,
        EditorError::Annotation(AnnotationError::OutOfBounds { len: 16, .. })
    ));
}

#[test]
fn test_note_update() {
    let mut harness = WorkspaceHarness::new();
    let id = harness.highlight(0, 5, HighlightColor::Pink);
    harness.ws.update_note(&id, "protagonist").unwrap();
    assert_eq!(harness.ws.annotation(&id).unwrap().note, "protagonist");
}

#[test]
fn test_offsets_counted_in_chars() {
    let mut harness = WorkspaceHarness::new();
    harness.ws.new_session_from_text("Zoë sees Åsa.").unwrap();
    let id = harness.highlight(9, 12, HighlightColor::Blue);
    assert_eq!(harness.ws.annotation(&id).unwrap().text, "Åsa");
}

// ============================================================================
// Rendered offsets
// ============================================================================

#[test]
fn test_indicator_glyph_excluded_from_offsets() {
    let mut harness = WorkspaceHarness::new();
    harness.symbol(12, 15, SymbolMark::Important);
    let tree = render_tree(harness.ws.text(), harness.ws.annotations());
    assert_eq!(tree.logical_text(), TEXT);

    // Segment 1 is the symbol mark: [indicator, "Bob"]
    let offset = logical_offset(&tree, &Boundary::new(vec![1, 1], 2)).unwrap();
    assert_eq!(offset, 14);
}

#[test]
fn test_selection_range_from_boundaries() {
    let mut harness = WorkspaceHarness::new();
    harness.symbol(0, 5, SymbolMark::Character);
    let tree = render_tree(harness.ws.text(), harness.ws.annotations());
    // Backwards selection from "meets" back into "Alice"
    let range = selection_range(&tree, &Boundary::new(vec![1], 5), &Boundary::new(vec![0, 1], 1)).unwrap();
    assert_eq!(range, SelectionRange::new(1, 10));
    assert!(selection_range(&tree, &Boundary::new(vec![1], 0), &Boundary::new(vec![1], 0)).is_none());
}

#[test]
fn test_click_resolves_innermost_annotation() {
    let mut harness = WorkspaceHarness::new();
    let outer = harness.highlight(0, 11, HighlightColor::Yellow);
    let inner = harness.symbol(6, 11, SymbolMark::Question);
    assert_eq!(harness.ws.annotation_at(7).unwrap().id, inner);
    assert_eq!(harness.ws.annotation_at(2).unwrap().id, outer);
    assert!(harness.ws.annotation_at(13).is_none());
}
