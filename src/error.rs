//! Error types shared across the crate.
//!
//! Connection validation errors live next to their validators in
//! [`crate::graph`].

use crate::graph::ValidationError;
use crate::model::{AnnotationId, ConnectionTypeId};
use thiserror::Error;

/// Rejections from the span model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("selection is empty")]
    EmptyRange,
    #[error("range {start}..{end} exceeds text length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("annotations cannot overlap (conflicts with {0})")]
    Overlap(AnnotationId),
    #[error("annotation {0} not found")]
    NotFound(AnnotationId),
}

/// Rejections from the connection graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("no connection is pending")]
    NotPending,
    #[error("annotation {0} not found")]
    UnknownAnnotation(AnnotationId),
    #[error("connection type `{0}` does not exist")]
    UnknownType(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Rejections from the connection type registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionTypeError {
    #[error("connection type label cannot be empty")]
    EmptyLabel,
    #[error("connection type `{0}` already exists")]
    DuplicateLabel(String),
    #[error("connection type {0} not found")]
    NotFound(ConnectionTypeId),
}

/// Failures reading or writing a session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to parse session file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid session file format: {0}")]
    Format(String),
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("there are no annotations to save")]
    NothingToSave,
}

/// Problems with an editor configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failures of the external transcription producer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptionError {
    #[error("transcription failed: {0}")]
    Producer(String),
    #[error("model returned no text")]
    EmptyResult,
    #[error("no transcription is in progress")]
    NotRunning,
}

/// Umbrella error for workspace commands.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    ConnectionType(#[from] ConnectionTypeError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    #[error("no document is loaded")]
    NoDocument,
    #[error("the document is still being transcribed")]
    DocumentLocked,
    #[error("the session is in an error state; reset to continue")]
    SessionFailed,
}
