//! Test harness around a [`Workspace`] loaded with [`TEXT`].
//!
//! Helper methods drive the workspace the way the UI does: through the
//! selection controller for interactive flows and through direct commands
//! otherwise.

#![allow(dead_code)]

use super::TEXT;
use slint_annotation_graph::{
    AnnotationId, AnnotationStyle, Connection, EditorConfig, EditorError, HighlightColor, InteractionEvent,
    Key, OverlapPolicy, Rect, SelectionRange, SymbolMark, Workspace,
};

pub struct WorkspaceHarness {
    pub ws: Workspace,
}

impl WorkspaceHarness {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn strict() -> Self {
        Self::with_config(EditorConfig {
            overlap: OverlapPolicy::Strict,
            ..EditorConfig::default()
        })
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let mut ws = Workspace::new(config);
        ws.new_session_from_text(TEXT).unwrap();
        Self { ws }
    }

    pub fn container() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 800.0)
    }

    pub fn anchor() -> Rect {
        Rect::new(200.0, 100.0, 60.0, 20.0)
    }

    // === Direct commands ===

    pub fn highlight(&mut self, start: usize, end: usize, color: HighlightColor) -> AnnotationId {
        self.ws
            .add_annotation(AnnotationStyle::Highlight(color), SelectionRange::new(start, end))
            .unwrap()
    }

    pub fn symbol(&mut self, start: usize, end: usize, mark: SymbolMark) -> AnnotationId {
        self.ws
            .add_annotation(AnnotationStyle::Symbol(mark), SelectionRange::new(start, end))
            .unwrap()
    }

    pub fn connect(&mut self, from: &AnnotationId, to: &AnnotationId, label: &str) -> Result<Connection, EditorError> {
        self.ws.begin_connection(from.clone(), label)?;
        self.ws.complete_connection(to.clone())
    }

    // === Simulated UI input ===

    pub fn select(&mut self, start: usize, end: usize) -> Result<(), EditorError> {
        self.ws.handle_interaction(InteractionEvent::TextSelected {
            range: SelectionRange::new(start, end),
            anchor: Self::anchor(),
            container: Self::container(),
        })
    }

    pub fn choose_tool(&mut self, style: AnnotationStyle) -> Result<(), EditorError> {
        self.ws.handle_interaction(InteractionEvent::ToolChosen(style))
    }

    pub fn click(&mut self, id: &AnnotationId) -> Result<(), EditorError> {
        self.ws.handle_interaction(InteractionEvent::AnnotationClicked {
            id: id.clone(),
            anchor: Self::anchor(),
            container: Self::container(),
        })
    }

    pub fn choose_connection_type(&mut self, label: &str) -> Result<(), EditorError> {
        self.ws
            .handle_interaction(InteractionEvent::ConnectionTypeChosen(label.to_string()))
    }

    pub fn press(&mut self, key: Key) -> Result<(), EditorError> {
        self.ws.handle_interaction(InteractionEvent::KeyPressed {
            key,
            editing_text: false,
        })
    }

    pub fn segment_bounds(&self) -> Vec<(usize, usize)> {
        super::bounds(&self.ws.segments())
    }
}
