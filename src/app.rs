//! Application state behind the user-facing commands.
//!
//! A [`Workspace`] owns the document, its annotations and connections, the
//! connection type labels and all derived view state. Every command takes
//! `&mut self` and runs to completion; derived state (layout, viewport fit)
//! is recomputed from scratch by [`Workspace::refresh_graph`] after each
//! mutation that affects it.
//!
//! Failures come in two flavours:
//!
//! - rejected input (empty selection, overlap in strict mode, duplicate
//!   connection or label) leaves state unchanged and queues a [`Notice`];
//! - a failed transcription or a bad session file puts the workspace into a
//!   [`SessionFailure`] that only [`Workspace::reset`] clears.

use std::path::Path;

use log::{debug, error, info, warn};

use crate::config::EditorConfig;
use crate::edges::{edge_geometries, EdgeGeometry};
use crate::error::{ConnectionError, EditorError, SessionError, TranscriptionError};
use crate::graph::{ConnectionGraph, PendingConnection};
#[cfg(feature = "layout")]
use crate::hierarchical::{hierarchical_layout, HierarchicalConfig};
use crate::layout::{fit_viewport, radial_layout, GraphLayout};
use crate::model::{
    Annotation, AnnotationId, AnnotationStyle, Connection, ConnectionType, ConnectionTypeId, Document,
    SelectionRange,
};
use crate::registry::ConnectionTypeRegistry;
use crate::selection::{Command, InteractionController, InteractionEvent};
use crate::session::SessionFile;
use crate::spans::{OverlapPolicy, Segment, SpanModel};
use crate::transcription::{ImagePayload, TranscriptBuffer, TranscriptionPhase, TranscriptionProducer};
use crate::viewport::ViewportInteraction;

/// A non-fatal, user-visible message about rejected input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Transcription,
    SessionFormat,
}

/// Terminal error state of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// How the annotation graph is arranged.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LayoutStrategy {
    #[default]
    Radial,
    #[cfg(feature = "layout")]
    Hierarchical(HierarchicalConfig),
}

pub struct Workspace {
    config: EditorConfig,
    document: Document,
    transcript: TranscriptBuffer,
    spans: SpanModel,
    graph: ConnectionGraph,
    types: ConnectionTypeRegistry,
    interaction: InteractionController,
    viewport: ViewportInteraction,
    layout: GraphLayout,
    strategy: LayoutStrategy,
    container: Option<(f32, f32)>,
    graph_visible: bool,
    notices: Vec<Notice>,
    failure: Option<SessionFailure>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Workspace {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            document: Document::default(),
            transcript: TranscriptBuffer::default(),
            spans: SpanModel::new(config.overlap),
            graph: ConnectionGraph::new(),
            types: ConnectionTypeRegistry::new(),
            interaction: InteractionController::new(config.toolbar),
            viewport: ViewportInteraction::new(config.viewport),
            layout: GraphLayout::default(),
            strategy: LayoutStrategy::default(),
            container: None,
            graph_visible: false,
            notices: Vec::new(),
            failure: None,
        }
    }

    // === Accessors ===

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> &str {
        self.document.text()
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.spans.annotations()
    }

    pub fn annotation(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.spans.get(id)
    }

    /// The innermost annotation covering the character at `offset`.
    pub fn annotation_at(&self, offset: usize) -> Option<&Annotation> {
        self.spans.annotations_at(offset).into_iter().next()
    }

    pub fn connections(&self) -> &[Connection] {
        self.graph.connections()
    }

    pub fn pending_connection(&self) -> Option<&PendingConnection> {
        self.graph.pending()
    }

    pub fn connection_types(&self) -> &[ConnectionType] {
        self.types.types()
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn viewport(&self) -> &ViewportInteraction {
        &self.viewport
    }

    pub fn layout(&self) -> &GraphLayout {
        &self.layout
    }

    pub fn layout_strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    pub fn transcription_phase(&self) -> TranscriptionPhase {
        self.transcript.phase()
    }

    pub fn is_graph_visible(&self) -> bool {
        self.graph_visible
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Text segments for rendering, recomputed on every call.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        self.spans.partition(self.document.text())
    }

    /// Edges drawn from the current node positions.
    pub fn edges(&self) -> Vec<EdgeGeometry> {
        edge_geometries(self.graph.connections(), &self.layout.nodes, &self.config.edges)
    }

    // === Session lifecycle ===

    /// Start over on pasted text. Blank text is rejected.
    pub fn new_session_from_text(&mut self, text: &str) -> Result<(), EditorError> {
        self.ensure_ready()?;
        if text.trim().is_empty() {
            return Err(self.reject(EditorError::NoDocument));
        }
        self.clear_session();
        self.document = Document::new(text);
        info!("new session from text: {} chars", self.document.char_len());
        self.refresh_graph();
        Ok(())
    }

    /// Run `producer` on `image`, appending each chunk as it arrives.
    pub fn transcribe_image<P>(&mut self, producer: &mut P, image: &ImagePayload) -> Result<(), EditorError>
    where
        P: TranscriptionProducer + ?Sized,
    {
        self.begin_transcription()?;
        let document = &mut self.document;
        let transcript = &mut self.transcript;
        let streamed = producer.transcribe(image, &mut |chunk: &str| {
            if transcript.record(chunk).is_ok() {
                document.append(chunk);
            }
        });
        if let Err(err) = streamed {
            self.fail_transcription(err.to_string());
            return Err(err.into());
        }
        self.finish_transcription()
    }

    /// Clear the session and start accepting transcription chunks.
    pub fn begin_transcription(&mut self) -> Result<(), EditorError> {
        self.ensure_ready()?;
        self.clear_session();
        self.transcript.begin();
        info!("transcription started");
        Ok(())
    }

    pub fn append_transcription(&mut self, chunk: &str) -> Result<(), EditorError> {
        self.transcript.record(chunk)?;
        self.document.append(chunk);
        Ok(())
    }

    /// Close the stream. A whitespace-only result fails the session.
    pub fn finish_transcription(&mut self) -> Result<(), EditorError> {
        match self.transcript.finish() {
            Ok(()) => {
                info!(
                    "transcription complete: {} chunks, {} chars",
                    self.transcript.chunks(),
                    self.document.char_len()
                );
                self.refresh_graph();
                Ok(())
            }
            Err(err) => {
                if err == TranscriptionError::EmptyResult {
                    self.fail_transcription(err.to_string());
                }
                Err(err.into())
            }
        }
    }

    /// Abandon the transcription. Partial text is discarded.
    pub fn fail_transcription(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("transcription failed: {message}");
        self.clear_session();
        self.failure = Some(SessionFailure {
            kind: FailureKind::Transcription,
            message,
        });
    }

    /// Back to an empty workspace. The only way out of a [`SessionFailure`].
    ///
    /// Configuration, layout strategy and container size survive.
    pub fn reset(&mut self) {
        let strategy = self.strategy;
        let container = self.container;
        *self = Self::new(self.config);
        self.strategy = strategy;
        self.container = container;
        info!("workspace reset");
    }

    // === Annotations ===

    pub fn add_annotation(&mut self, style: AnnotationStyle, range: SelectionRange) -> Result<AnnotationId, EditorError> {
        self.ensure_ready()?;
        if self.transcript.is_streaming() {
            return Err(self.reject(EditorError::DocumentLocked));
        }
        if self.document.is_empty() {
            return Err(self.reject(EditorError::NoDocument));
        }
        let added = self
            .spans
            .add(style, range, self.document.text())
            .map(|ann| ann.id.clone());
        match added {
            Ok(id) => {
                self.refresh_graph();
                Ok(id)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn update_note(&mut self, id: &AnnotationId, note: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_ready()?;
        match self.spans.update_note(id, note) {
            Ok(()) => {
                debug!("note updated on {id}");
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Remove an annotation and every connection touching it. Returns how
    /// many connections went with it.
    pub fn delete_annotation(&mut self, id: &AnnotationId) -> Result<usize, EditorError> {
        self.ensure_ready()?;
        if let Err(err) = self.spans.remove(id) {
            return Err(self.reject(err));
        }
        let removed = self.graph.delete_by_annotation(id);
        self.interaction.annotation_removed(id);
        info!("annotation {id} deleted with {removed} connections");
        self.refresh_graph();
        Ok(removed)
    }

    pub fn set_overlap_policy(&mut self, policy: OverlapPolicy) {
        self.config.overlap = policy;
        self.spans.set_policy(policy);
    }

    // === Connections ===

    /// Enter pending-connection mode from `from` with the type labelled
    /// `label`.
    pub fn begin_connection(&mut self, from: AnnotationId, label: &str) -> Result<(), EditorError> {
        self.ensure_ready()?;
        if !self.spans.contains(&from) {
            self.interaction.connection_cancelled();
            return Err(self.reject(ConnectionError::UnknownAnnotation(from)));
        }
        let Some(label) = self.types.find_by_label(label).map(|ty| ty.label.clone()) else {
            self.interaction.connection_cancelled();
            return Err(self.reject(ConnectionError::UnknownType(label.trim().to_string())));
        };
        debug!("connection pending from {from} as {label}");
        self.graph.begin(from, label);
        Ok(())
    }

    /// Finish the pending connection at `to`. Pending mode ends either way.
    pub fn complete_connection(&mut self, to: AnnotationId) -> Result<Connection, EditorError> {
        self.ensure_ready()?;
        self.interaction.connection_cancelled();
        if !self.spans.contains(&to) {
            self.graph.cancel();
            return Err(self.reject(ConnectionError::UnknownAnnotation(to)));
        }
        match self.graph.complete(to) {
            Ok(connection) => {
                self.refresh_graph();
                Ok(connection)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn cancel_connection(&mut self) {
        if self.graph.is_pending() {
            debug!("pending connection cancelled");
        }
        self.graph.cancel();
        self.interaction.connection_cancelled();
    }

    // === Connection types ===

    pub fn add_connection_type(&mut self, label: &str) -> Result<ConnectionTypeId, EditorError> {
        self.ensure_ready()?;
        let added = self.types.add(label).map(|ty| ty.id.clone());
        added.map_err(|err| self.reject(err))
    }

    /// Rename a type and relabel its connections. Returns how many were
    /// relabelled.
    pub fn rename_connection_type(&mut self, id: &ConnectionTypeId, label: &str) -> Result<usize, EditorError> {
        self.ensure_ready()?;
        let old = match self.types.rename(id, label) {
            Ok(old) => old,
            Err(err) => return Err(self.reject(err)),
        };
        let new = self.types.get(id).map(|ty| ty.label.clone()).unwrap_or_default();
        let relabelled = self.graph.relabel(&old, &new);
        debug!("connection type {id} renamed, {relabelled} connections relabelled");
        Ok(relabelled)
    }

    /// Delete a type together with every connection using it. Returns how
    /// many connections were removed.
    pub fn delete_connection_type(&mut self, id: &ConnectionTypeId) -> Result<usize, EditorError> {
        self.ensure_ready()?;
        let removed_type = match self.types.remove(id) {
            Ok(ty) => ty,
            Err(err) => return Err(self.reject(err)),
        };
        let removed = self.graph.delete_by_type(&removed_type.label);
        if !self.graph.is_pending() {
            self.interaction.connection_cancelled();
        }
        info!("connection type {id} deleted with {removed} connections");
        self.refresh_graph();
        Ok(removed)
    }

    // === Persistence ===

    /// The persisted part of the workspace.
    pub fn snapshot(&self) -> SessionFile {
        SessionFile {
            text: self.document.text().to_string(),
            annotations: self.spans.annotations().to_vec(),
            connections: self.graph.connections().to_vec(),
            connection_types: self.types.types().to_vec(),
        }
    }

    /// Serialize the session. Refused while there is nothing annotated.
    pub fn save_session(&mut self) -> Result<String, EditorError> {
        self.ensure_ready()?;
        if self.spans.is_empty() {
            return Err(self.reject(SessionError::NothingToSave));
        }
        Ok(self.snapshot().to_json()?)
    }

    pub fn save_session_to_path(&mut self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        self.ensure_ready()?;
        if self.spans.is_empty() {
            return Err(self.reject(SessionError::NothingToSave));
        }
        Ok(self.snapshot().save_to_path(path)?)
    }

    /// Replace the session with a parsed snapshot. A bad file leaves the
    /// data untouched and fails the session.
    pub fn load_session(&mut self, json: &str) -> Result<(), EditorError> {
        self.ensure_ready()?;
        match SessionFile::from_json(json) {
            Ok(session) => {
                self.apply_session(session);
                Ok(())
            }
            Err(err) => Err(self.session_failed(err)),
        }
    }

    pub fn load_session_from_path(&mut self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        self.ensure_ready()?;
        match SessionFile::load_from_path(path) {
            Ok(session) => {
                self.apply_session(session);
                Ok(())
            }
            Err(err) => Err(self.session_failed(err)),
        }
    }

    fn apply_session(&mut self, session: SessionFile) {
        self.document = Document::new(session.text);
        self.transcript.reset();
        self.spans.replace_all(session.annotations);
        self.graph.replace_all(session.connections);
        self.types = ConnectionTypeRegistry::from_types(session.connection_types);
        self.interaction.reset();
        info!(
            "session applied: {} annotations, {} connections",
            self.spans.len(),
            self.graph.len()
        );
        self.refresh_graph();
    }

    fn session_failed(&mut self, err: SessionError) -> EditorError {
        error!("session load failed: {err}");
        self.failure = Some(SessionFailure {
            kind: FailureKind::SessionFormat,
            message: err.to_string(),
        });
        err.into()
    }

    // === Interaction ===

    /// Feed a text-surface event through the selection controller and apply
    /// the commands it produces. Returns the first command failure.
    pub fn handle_interaction(&mut self, event: InteractionEvent) -> Result<(), EditorError> {
        self.ensure_ready()?;
        let commands = self.interaction.handle(event);
        let mut first_error = None;
        for command in commands {
            if let Err(err) = self.apply_command(command) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn apply_command(&mut self, command: Command) -> Result<(), EditorError> {
        match command {
            Command::CreateAnnotation { style, range } => self.add_annotation(style, range).map(|_| ()),
            Command::BeginConnection { from, connection_type } => self.begin_connection(from, &connection_type),
            Command::CompleteConnection { to } => self.complete_connection(to).map(|_| ()),
            Command::CancelConnection => {
                self.cancel_connection();
                Ok(())
            }
            Command::DeleteAnnotation(id) => self.delete_annotation(&id).map(|_| ()),
        }
    }

    // === Graph view ===

    pub fn toggle_graph_view(&mut self) -> bool {
        self.graph_visible = !self.graph_visible;
        if self.graph_visible {
            self.refresh_graph();
        }
        self.graph_visible
    }

    pub fn set_layout_strategy(&mut self, strategy: LayoutStrategy) {
        self.strategy = strategy;
        self.refresh_graph();
    }

    /// Record the graph surface size and refit the viewport to it.
    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.container = Some((width, height));
        self.fit_to_container();
    }

    /// Recompute the layout from the current annotations and connections,
    /// then refit the viewport. Dragged positions are discarded.
    pub fn refresh_graph(&mut self) {
        let annotations = self.spans.annotations();
        let connections = self.graph.connections();
        self.layout = match &self.strategy {
            LayoutStrategy::Radial => radial_layout(annotations, connections, &self.config.layout),
            #[cfg(feature = "layout")]
            LayoutStrategy::Hierarchical(hierarchical) => {
                hierarchical_layout(annotations, connections, &self.config.layout, hierarchical)
            }
        };
        self.fit_to_container();
    }

    fn fit_to_container(&mut self) {
        let Some((width, height)) = self.container else {
            return;
        };
        if let Some(transform) = fit_viewport(self.layout.radius, width, height, &self.config.layout) {
            self.viewport.set_transform(transform);
        }
    }

    pub fn graph_wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        self.viewport.wheel(x, y, delta_y)
    }

    pub fn graph_pointer_down(&mut self, x: f32, y: f32) -> Option<AnnotationId> {
        self.viewport.pointer_down(x, y, &self.layout.nodes)
    }

    pub fn graph_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.viewport.pointer_move(x, y, &mut self.layout.nodes)
    }

    pub fn graph_pointer_up(&mut self) {
        self.viewport.pointer_up();
    }

    pub fn graph_pointer_leave(&mut self) {
        self.viewport.pointer_leave();
    }

    // === Helpers ===

    fn ensure_ready(&self) -> Result<(), EditorError> {
        if self.failure.is_some() {
            return Err(EditorError::SessionFailed);
        }
        Ok(())
    }

    fn reject(&mut self, err: impl Into<EditorError>) -> EditorError {
        let err = err.into();
        warn!("rejected: {err}");
        self.notices.push(Notice {
            message: err.to_string(),
        });
        err
    }

    fn clear_session(&mut self) {
        self.document = Document::default();
        self.transcript.reset();
        self.spans.clear();
        self.graph.clear();
        self.interaction.reset();
        self.layout = GraphLayout::default();
        self.graph_visible = false;
        self.notices.clear();
    }
}
