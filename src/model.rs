//! Core data types: documents, annotations, connections and their ids.
//!
//! Offsets are counted in `char`s (Unicode scalar values) of the document
//! text and always describe half-open ranges `[start, end)`.

use serde::{Deserialize, Serialize};
use slint::Color;
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh unique id.
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), uuid::Uuid::new_v4()))
            }

            /// Wrap an existing token, e.g. one read back from a session file.
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

opaque_id!(
    /// Opaque identifier of an [`Annotation`].
    AnnotationId,
    "ann"
);
opaque_id!(
    /// Opaque identifier of a [`Connection`].
    ConnectionId,
    "conn"
);
opaque_id!(
    /// Opaque identifier of a [`ConnectionType`].
    ConnectionTypeId,
    "ct"
);

/// Number of characters in `text`, the unit every offset is measured in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Substring of `text` between two char offsets.
///
/// Offsets past the end are clamped to the text length.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |offset: usize| {
        text.char_indices()
            .nth(offset)
            .map(|(byte, _)| byte)
            .unwrap_or(text.len())
    };
    let start_byte = byte_at(start);
    let end_byte = byte_at(end.max(start));
    &text[start_byte..end_byte]
}

// ============================================================================
// Annotation styles
// ============================================================================

/// Highlight colors offered by the quick toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Pink,
    Blue,
    Green,
    Yellow,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 4] = [Self::Pink, Self::Blue, Self::Green, Self::Yellow];

    /// Wire value used in session files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// Background fill used when rendering the highlighted text.
    pub fn fill(self) -> Color {
        match self {
            Self::Pink => Color::from_rgb_u8(0xfb, 0xcf, 0xe8),
            Self::Blue => Color::from_rgb_u8(0xbf, 0xdb, 0xfe),
            Self::Green => Color::from_rgb_u8(0xbb, 0xf7, 0xd0),
            Self::Yellow => Color::from_rgb_u8(0xfe, 0xf0, 0x8a),
        }
    }
}

/// Symbolic markers, each rendered with a small glyph badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolMark {
    Question,
    Important,
    Character,
    Device,
}

impl SymbolMark {
    pub const ALL: [SymbolMark; 4] = [
        Self::Question,
        Self::Important,
        Self::Character,
        Self::Device,
    ];

    /// Glyph shown in the indicator badge, also the session file value.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Question => "?",
            Self::Important => "!",
            Self::Character => "O",
            Self::Device => "*",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.glyph() == value)
    }

    pub fn fill(self) -> Color {
        match self {
            Self::Question => Color::from_rgb_u8(0xe5, 0xe7, 0xeb),
            Self::Important => Color::from_rgb_u8(0xfe, 0xca, 0xca),
            Self::Character => Color::from_rgb_u8(0xe9, 0xd5, 0xff),
            Self::Device => Color::from_rgb_u8(0xc7, 0xd2, 0xfe),
        }
    }
}

/// Discriminant of [`AnnotationStyle`], the `type` field on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Highlight,
    Symbol,
}

/// Visual style of an annotation. The value set always matches the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationStyle {
    Highlight(HighlightColor),
    Symbol(SymbolMark),
}

impl AnnotationStyle {
    pub fn kind(self) -> AnnotationKind {
        match self {
            Self::Highlight(_) => AnnotationKind::Highlight,
            Self::Symbol(_) => AnnotationKind::Symbol,
        }
    }

    /// Wire value: a color name or a symbol glyph.
    pub fn value(self) -> &'static str {
        match self {
            Self::Highlight(color) => color.as_str(),
            Self::Symbol(mark) => mark.glyph(),
        }
    }

    /// Rebuild a style from its wire `type` and `value`.
    ///
    /// Returns `None` when the value does not belong to the kind's set.
    pub fn from_parts(kind: AnnotationKind, value: &str) -> Option<Self> {
        match kind {
            AnnotationKind::Highlight => HighlightColor::parse(value).map(Self::Highlight),
            AnnotationKind::Symbol => SymbolMark::parse(value).map(Self::Symbol),
        }
    }

    pub fn fill(self) -> Color {
        match self {
            Self::Highlight(color) => color.fill(),
            Self::Symbol(mark) => mark.fill(),
        }
    }

    /// Glyph for the inline indicator badge, if the style has one.
    pub fn indicator(self) -> Option<&'static str> {
        match self {
            Self::Highlight(_) => None,
            Self::Symbol(mark) => Some(mark.glyph()),
        }
    }
}

// ============================================================================
// Annotation
// ============================================================================

/// A styled range over the document text with an optional note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnnotation", into = "RawAnnotation")]
pub struct Annotation {
    pub id: AnnotationId,
    pub start: usize,
    pub end: usize,
    /// Snapshot of `document[start..end)` taken at creation time.
    pub text: String,
    pub style: AnnotationStyle,
    pub note: String,
}

impl Annotation {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether this annotation's range intersects `[start, end)`.
    pub fn intersects(&self, start: usize, end: usize) -> bool {
        self.start < end && self.end > start
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn kind(&self) -> AnnotationKind {
        self.style.kind()
    }
}

/// Wire form of [`Annotation`], with `type` and `value` as separate fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawAnnotation {
    id: AnnotationId,
    start: usize,
    end: usize,
    #[serde(default)]
    text: String,
    #[serde(rename = "type")]
    kind: AnnotationKind,
    value: String,
    #[serde(default)]
    note: String,
}

impl TryFrom<RawAnnotation> for Annotation {
    type Error = String;

    fn try_from(raw: RawAnnotation) -> Result<Self, Self::Error> {
        let style = AnnotationStyle::from_parts(raw.kind, &raw.value).ok_or_else(|| {
            format!(
                "annotation {}: value `{}` is not valid for type {:?}",
                raw.id, raw.value, raw.kind
            )
        })?;
        if raw.start >= raw.end {
            return Err(format!(
                "annotation {}: empty range {}..{}",
                raw.id, raw.start, raw.end
            ));
        }
        Ok(Self {
            id: raw.id,
            start: raw.start,
            end: raw.end,
            text: raw.text,
            style,
            note: raw.note,
        })
    }
}

impl From<Annotation> for RawAnnotation {
    fn from(ann: Annotation) -> Self {
        Self {
            id: ann.id,
            start: ann.start,
            end: ann.end,
            text: ann.text,
            kind: ann.style.kind(),
            value: ann.style.value().to_string(),
            note: ann.note,
        }
    }
}

// ============================================================================
// Connections
// ============================================================================

/// A directed, typed edge between two annotations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: AnnotationId,
    pub to: AnnotationId,
    /// Label of the [`ConnectionType`] this edge was created with.
    #[serde(rename = "type")]
    pub connection_type: String,
}

impl Connection {
    pub fn touches(&self, id: &AnnotationId) -> bool {
        &self.from == id || &self.to == id
    }

    /// Whether this connection joins `a` and `b` in either direction.
    pub fn joins(&self, a: &AnnotationId, b: &AnnotationId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }
}

/// A user-editable connection label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionType {
    pub id: ConnectionTypeId,
    pub label: String,
}

// ============================================================================
// Document and selection
// ============================================================================

/// The annotated text. Append-only while a transcription streams in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    pub fn slice(&self, start: usize, end: usize) -> &str {
        char_slice(&self.text, start, end)
    }
}

/// A transient text selection in char offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A selection only counts when it spans at least one character.
    pub fn is_active(&self) -> bool {
        self.start < self.end
    }
}
