//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use slint_annotation_graph::{Annotation, AnnotationId, AnnotationStyle, HighlightColor, Segment};

pub const TEXT: &str = "Alice meets Bob.";

/// A pink highlight over `[start, end)` of `text`, built without a span model.
pub fn annotation(id: &str, start: usize, end: usize, text: &str) -> Annotation {
    Annotation {
        id: AnnotationId::from_raw(id),
        start,
        end,
        text: text.chars().skip(start).take(end - start).collect(),
        style: AnnotationStyle::Highlight(HighlightColor::Pink),
        note: String::new(),
    }
}

/// `(start, end)` of every segment.
pub fn bounds(segments: &[Segment<'_>]) -> Vec<(usize, usize)> {
    segments.iter().map(|seg| (seg.start, seg.end)).collect()
}

/// Assert segments tile `[0, len)` with no gaps or overlaps.
pub fn assert_tiles(segments: &[Segment<'_>], len: usize) {
    let mut cursor = 0;
    for seg in segments {
        assert_eq!(seg.start, cursor, "gap or overlap at {cursor}");
        assert!(seg.end > seg.start, "empty segment at {}", seg.start);
        cursor = seg.end;
    }
    assert_eq!(cursor, len);
}

pub fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-3, "{a} != {b}");
}
