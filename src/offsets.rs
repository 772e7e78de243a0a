//! Mapping rendered selections back to logical text offsets.
//!
//! The rendered document is a tree of text runs wrapped in styled marks.
//! Symbol annotations insert a small indicator glyph into that tree which is
//! not part of the document text, so a native selection boundary cannot be
//! turned into an offset by simply counting characters. [`logical_offset`]
//! walks text nodes in document order and skips anything below a decorative
//! element.

use crate::model::{char_len, Annotation, SelectionRange};
use crate::spans::{partition, Segment};

/// A node of the rendered span tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderNode {
    Text(String),
    Element {
        /// Decorative elements (indicator badges) hold no logical text.
        decorative: bool,
        children: Vec<RenderNode>,
    },
}

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn element(children: Vec<RenderNode>) -> Self {
        Self::Element {
            decorative: false,
            children,
        }
    }

    pub fn indicator(glyph: impl Into<String>) -> Self {
        Self::Element {
            decorative: true,
            children: vec![Self::Text(glyph.into())],
        }
    }

    /// Follow a path of child indices from this node.
    pub fn node_at(&self, path: &[usize]) -> Option<&RenderNode> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => match self {
                Self::Element { children, .. } => children.get(index)?.node_at(rest),
                Self::Text(_) => None,
            },
        }
    }

    /// Everything the renderer shows, indicator glyphs included.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Element { children, .. } => children.iter().map(Self::display_text).collect(),
        }
    }

    /// Concatenated logical text, excluding decorative content.
    pub fn logical_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(false, &mut out);
        out
    }

    fn collect_text(&self, hidden: bool, out: &mut String) {
        match self {
            Self::Text(text) => {
                if !hidden {
                    out.push_str(text);
                }
            }
            Self::Element { decorative, children } => {
                for child in children {
                    child.collect_text(hidden || *decorative, out);
                }
            }
        }
    }
}

/// A selection boundary: a text node (by child-index path) and a char offset
/// inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boundary {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Boundary {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Build the tree a renderer shows for `text` under `annotations`.
///
/// The root holds one child per partition segment. Plain segments are bare
/// text; covered segments are wrapped once per annotation, narrowest
/// innermost, and symbol annotations prepend their indicator glyph inside
/// their mark.
pub fn render_tree(text: &str, annotations: &[Annotation]) -> RenderNode {
    let children = partition(text, annotations)
        .into_iter()
        .map(|segment| {
            let mut node = RenderNode::text(segment.text);
            for ann in &segment.annotations {
                let mut mark = Vec::with_capacity(2);
                if let Some(glyph) = ann.style.indicator() {
                    mark.push(RenderNode::indicator(glyph));
                }
                mark.push(node);
                node = RenderNode::element(mark);
            }
            node
        })
        .collect();
    RenderNode::element(children)
}

/// Indicator glyphs [`render_tree`] places in front of `segment`'s text,
/// outermost mark first.
pub fn segment_indicators(segment: &Segment<'_>) -> String {
    segment
        .annotations
        .iter()
        .rev()
        .filter_map(|ann| ann.style.indicator())
        .collect()
}

/// Logical char offset of `boundary` within `root`.
///
/// Returns `None` when the boundary path does not address a text node.
pub fn logical_offset(root: &RenderNode, boundary: &Boundary) -> Option<usize> {
    match root.node_at(&boundary.path)? {
        RenderNode::Text(_) => {}
        RenderNode::Element { .. } => return None,
    }
    let mut path = Vec::new();
    let mut offset = 0;
    walk(root, &mut path, false, boundary, &mut offset).then_some(offset)
}

/// Depth-first walk accumulating logical length until `boundary` is reached.
fn walk(
    node: &RenderNode,
    path: &mut Vec<usize>,
    hidden: bool,
    boundary: &Boundary,
    offset: &mut usize,
) -> bool {
    match node {
        RenderNode::Text(text) => {
            if path.as_slice() == boundary.path.as_slice() {
                if !hidden {
                    *offset += boundary.offset.min(char_len(text));
                }
                return true;
            }
            if !hidden {
                *offset += char_len(text);
            }
            false
        }
        RenderNode::Element { decorative, children } => {
            for (index, child) in children.iter().enumerate() {
                path.push(index);
                let found = walk(child, path, hidden || *decorative, boundary, offset);
                path.pop();
                if found {
                    return true;
                }
            }
            false
        }
    }
}

/// Convert a rendered selection into an ordered, non-empty char range.
pub fn selection_range(root: &RenderNode, anchor: &Boundary, focus: &Boundary) -> Option<SelectionRange> {
    let a = logical_offset(root, anchor)?;
    let b = logical_offset(root, focus)?;
    let range = SelectionRange::new(a.min(b), a.max(b));
    range.is_active().then_some(range)
}
