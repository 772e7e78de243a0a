//! The annotation span model and the gapless text partition used for rendering.
//!
//! Annotations are half-open char ranges over the document text, kept sorted
//! by `start`. Rendering never walks annotations directly: it asks for a
//! [`partition`] of the text, which is recomputed from scratch every time.

use crate::error::AnnotationError;
use crate::model::{char_len, char_slice, Annotation, AnnotationId, AnnotationStyle, SelectionRange};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether new annotations may overlap existing ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Reject any new range intersecting an existing annotation.
    Strict,
    /// Allow overlapping and nested annotations.
    #[default]
    Nested,
}

/// Ordered set of annotations over one document.
#[derive(Clone, Debug, Default)]
pub struct SpanModel {
    annotations: Vec<Annotation>,
    policy: OverlapPolicy,
}

impl SpanModel {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            annotations: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: OverlapPolicy) {
        self.policy = policy;
    }

    /// Annotations sorted by `start`.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|ann| &ann.id == id)
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.get(id).is_some()
    }

    /// Create an annotation over `range` of `text`.
    ///
    /// The cached annotation text is the slice of `text` at creation time.
    pub fn add(
        &mut self,
        style: AnnotationStyle,
        range: SelectionRange,
        text: &str,
    ) -> Result<&Annotation, AnnotationError> {
        if !range.is_active() {
            return Err(AnnotationError::EmptyRange);
        }
        let len = char_len(text);
        if range.end > len {
            return Err(AnnotationError::OutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        if self.policy == OverlapPolicy::Strict {
            if let Some(existing) = self
                .annotations
                .iter()
                .find(|ann| ann.intersects(range.start, range.end))
            {
                debug!(
                    "rejecting {}..{}: overlaps {}",
                    range.start, range.end, existing.id
                );
                return Err(AnnotationError::Overlap(existing.id.clone()));
            }
        }

        let annotation = Annotation {
            id: AnnotationId::generate(),
            start: range.start,
            end: range.end,
            text: char_slice(text, range.start, range.end).to_string(),
            style,
            note: String::new(),
        };
        info!(
            "annotation {} added at {}..{} ({:?})",
            annotation.id,
            annotation.start,
            annotation.end,
            style.kind()
        );
        // Insert after every annotation with the same start so creation order
        // breaks ties.
        let index = self
            .annotations
            .partition_point(|ann| ann.start <= annotation.start);
        self.annotations.insert(index, annotation);
        Ok(&self.annotations[index])
    }

    pub fn update_note(&mut self, id: &AnnotationId, note: impl Into<String>) -> Result<(), AnnotationError> {
        let ann = self
            .annotations
            .iter_mut()
            .find(|ann| &ann.id == id)
            .ok_or_else(|| AnnotationError::NotFound(id.clone()))?;
        ann.note = note.into();
        Ok(())
    }

    /// Remove an annotation. Connections referencing it are not touched here.
    pub fn remove(&mut self, id: &AnnotationId) -> Result<Annotation, AnnotationError> {
        let index = self
            .annotations
            .iter()
            .position(|ann| &ann.id == id)
            .ok_or_else(|| AnnotationError::NotFound(id.clone()))?;
        info!("annotation {} removed", id);
        Ok(self.annotations.remove(index))
    }

    /// Replace the whole set, e.g. from a loaded session. Overlaps are kept.
    pub fn replace_all(&mut self, mut annotations: Vec<Annotation>) {
        annotations.sort_by_key(|ann| ann.start);
        self.annotations = annotations;
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Annotations covering the character at `offset`, narrowest first.
    pub fn annotations_at(&self, offset: usize) -> Vec<&Annotation> {
        let mut covering: Vec<&Annotation> = self
            .annotations
            .iter()
            .filter(|ann| ann.contains_offset(offset))
            .collect();
        covering.sort_by_key(|ann| ann.len());
        covering
    }

    /// Partition of `text` under the current annotations.
    pub fn partition<'a>(&'a self, text: &'a str) -> Vec<Segment<'a>> {
        partition(text, &self.annotations)
    }
}

/// A maximal run of text covered by the same set of annotations.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
    /// Covering annotations, narrowest first.
    pub annotations: Vec<&'a Annotation>,
}

impl Segment<'_> {
    pub fn is_plain(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Ids of the covering annotations, narrowest first.
    pub fn annotation_ids(&self) -> Vec<AnnotationId> {
        self.annotations.iter().map(|ann| ann.id.clone()).collect()
    }
}

/// Split `text` into contiguous segments at every annotation boundary.
///
/// Segments cover `[0, char_len(text))` exactly once, in order. Each segment
/// lists the annotations intersecting it, sorted by ascending length so the
/// most specific annotation is applied last (rendered innermost). Annotation
/// boundaries past the end of `text` (a growing transcription, say) are
/// ignored.
pub fn partition<'a>(text: &'a str, annotations: &'a [Annotation]) -> Vec<Segment<'a>> {
    let len = char_len(text);
    let mut points = BTreeSet::new();
    points.insert(0);
    points.insert(len);
    for ann in annotations {
        points.insert(ann.start.min(len));
        points.insert(ann.end.min(len));
    }

    let points: Vec<usize> = points.into_iter().collect();
    let bytes = byte_offsets(text, &points);
    let mut segments = Vec::with_capacity(points.len().saturating_sub(1));
    for (index, window) in points.windows(2).enumerate() {
        let (start, end) = (window[0], window[1]);
        if start >= end {
            continue;
        }
        let mut covering: Vec<&Annotation> = annotations
            .iter()
            .filter(|ann| ann.intersects(start, end))
            .collect();
        covering.sort_by_key(|ann| ann.len());
        segments.push(Segment {
            start,
            end,
            text: &text[bytes[index]..bytes[index + 1]],
            annotations: covering,
        });
    }
    segments
}

/// Byte positions of ascending char offsets, found in one pass over `text`.
/// Offsets past the end map to `text.len()`.
fn byte_offsets(text: &str, points: &[usize]) -> Vec<usize> {
    let mut boundaries = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .enumerate();
    points
        .iter()
        .map(|&point| {
            boundaries
                .find(|&(offset, _)| offset == point)
                .map_or(text.len(), |(_, byte)| byte)
        })
        .collect()
}
