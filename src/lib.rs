//! # Slint Annotation Graph
//!
//! Editing core for an annotation tool: mark up a text with highlights and
//! symbol markers, attach notes, link annotations with typed directed
//! connections, and browse the result as a radial mind graph with pan, zoom
//! and node dragging.
//!
//! The crate ships no `.slint` UI. It provides the state, the geometry and a
//! [`EditorController`] whose `VecModel`s and callback factories a Slint
//! front-end binds to.
//!
//! ## Quick Start
//!
//! ```
//! use slint_annotation_graph::{AnnotationStyle, HighlightColor, SelectionRange, Workspace};
//!
//! let mut ws = Workspace::default();
//! ws.new_session_from_text("Alice meets Bob.").unwrap();
//! let alice = ws
//!     .add_annotation(AnnotationStyle::Highlight(HighlightColor::Pink), SelectionRange::new(0, 5))
//!     .unwrap();
//! assert_eq!(ws.segments().len(), 2);
//! assert_eq!(ws.layout().main.as_ref(), Some(&alice));
//! ```
//!
//! ## Modules
//!
//! - [`spans`] - ordered annotation set and text partitioning
//! - [`offsets`] - logical char offsets from a rendered span tree
//! - [`graph`] - connections, pending mode and connection validation
//! - [`registry`] - user-editable connection type labels
//! - [`selection`] - selection/toolbar state machine
//! - [`layout`] - radial graph layout and auto-fit
//! - `hierarchical` - layered layout (feature `layout`)
//! - [`viewport`] - zoom-to-cursor, pan and node drag
//! - [`edges`] - edge lines, arrow heads and label placement
//! - [`session`] - JSON session files
//! - [`transcription`] - image transcription producer interface
//! - [`app`] - the [`Workspace`] tying it all together
//! - [`controller`] - Slint model sync and callbacks

pub mod app;
pub mod config;
pub mod controller;
pub mod edges;
pub mod error;
pub mod graph;
#[cfg(feature = "layout")]
pub mod hierarchical;
pub mod layout;
pub mod logging;
pub mod model;
pub mod offsets;
pub mod registry;
pub mod selection;
pub mod session;
pub mod spans;
pub mod transcription;
pub mod viewport;

pub use app::{FailureKind, LayoutStrategy, Notice, SessionFailure, Workspace};
pub use config::EditorConfig;
pub use controller::{AnnotationRow, ConnectionTypeRow, EdgeRow, EditorController, NodeRow, SegmentRow};
pub use edges::{edge_geometries, edge_geometry, find_edge_at, label_placement, EdgeGeometry, EdgeStyle, LabelAnchor};
pub use error::{
    AnnotationError, ConfigError, ConnectionError, ConnectionTypeError, EditorError, SessionError,
    TranscriptionError,
};
pub use graph::{
    ConnectionGraph, PendingConnection,
    // Connection validation framework
    ConnectionValidator, CompositeValidator, DistinctEndpointsValidator, NoDuplicatePairValidator,
    ValidationError, ValidationResult, default_validator, validate_connection,
};
#[cfg(feature = "layout")]
pub use hierarchical::{hierarchical_layout, Direction, HierarchicalConfig};
pub use hit_test::{find_node_at, NodeGeometry};
pub use layout::{
    fit_viewport, layout_radius, main_node, node_dimensions, radial_layout, GraphLayout, GraphNode,
    RadialLayoutConfig,
};
pub use logging::{init_logging, LoggingError};
pub use model::{
    Annotation, AnnotationId, AnnotationKind, AnnotationStyle, Connection, ConnectionId, ConnectionType,
    ConnectionTypeId, Document, HighlightColor, SelectionRange, SymbolMark,
};
pub use offsets::{logical_offset, render_tree, segment_indicators, selection_range, Boundary, RenderNode};
pub use registry::{default_connection_types, ConnectionTypeRegistry};
pub use selection::{
    place_toolbar, Command, InteractionController, InteractionEvent, InteractionState, Key, Rect,
    ToolbarConfig, ToolbarPlacement,
};
pub use session::SessionFile;
pub use spans::{partition, OverlapPolicy, Segment, SpanModel};
pub use transcription::{ImagePayload, TranscriptBuffer, TranscriptionPhase, TranscriptionProducer};
pub use viewport::{Gesture, ViewportConfig, ViewportInteraction, ViewportTransform};
