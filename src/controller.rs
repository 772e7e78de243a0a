//! Slint-facing controller for annotation editor applications.
//!
//! [`EditorController`] wraps a [`Workspace`] and keeps a set of
//! `VecModel`s in sync with it, so a `.slint` front-end can bind the
//! annotation list, the rendered text segments and the graph view directly.
//!
//! # Example
//!
//! ```ignore
//! use slint_annotation_graph::EditorController;
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let ctrl = EditorController::default();
//!
//!     window.set_annotations(ctrl.annotations_model());
//!     window.set_segments(ctrl.segments_model());
//!     window.set_nodes(ctrl.nodes_model());
//!     window.set_edges(ctrl.edges_model());
//!
//!     window.on_tool_chosen(ctrl.tool_chosen_callback());
//!     window.on_connection_type_chosen(ctrl.connection_type_chosen_callback());
//!     window.on_key_pressed(ctrl.key_pressed_callback());
//!     window.on_note_edited(ctrl.note_edited_callback());
//!
//!     // Graph surface
//!     window.on_graph_wheel(ctrl.graph_wheel_callback());
//!     window.on_graph_pointer_down(ctrl.graph_pointer_down_callback());
//!     window.on_graph_pointer_move(ctrl.graph_pointer_move_callback());
//!     window.on_graph_pointer_up(ctrl.graph_pointer_up_callback());
//!
//!     window.on_text_submitted({
//!         let ctrl = ctrl.clone();
//!         move |text| {
//!             let _ = ctrl.new_session_from_text(&text);
//!         }
//!     });
//!
//!     window.run().unwrap();
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use slint::{Color, ModelRc, SharedString, VecModel};

use crate::app::Workspace;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::model::{AnnotationId, AnnotationKind, AnnotationStyle, ConnectionTypeId, SelectionRange};
use crate::offsets::segment_indicators;
use crate::selection::{InteractionEvent, Key, Rect};

/// One entry of the annotation sidebar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationRow {
    pub id: SharedString,
    pub start: i32,
    pub end: i32,
    pub text: SharedString,
    pub note: SharedString,
    pub kind: SharedString,
    pub value: SharedString,
    pub fill: Color,
    pub focused: bool,
    pub connection_count: i32,
}

/// A run of rendered text. `fill` comes from the innermost annotation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentRow {
    pub start: i32,
    pub end: i32,
    pub text: SharedString,
    pub annotated: bool,
    pub fill: Color,
    /// Id of the innermost annotation, empty for plain text.
    pub annotation_id: SharedString,
    /// Indicator glyphs shown before the text, outermost mark first. Matches
    /// [`render_tree`](crate::offsets::render_tree).
    pub indicator: SharedString,
    pub depth: i32,
}

/// A graph node in graph space. The view applies the viewport transform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeRow {
    pub id: SharedString,
    pub label: SharedString,
    pub note: SharedString,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Color,
    pub is_main: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeRow {
    pub id: SharedString,
    pub path_commands: SharedString,
    pub arrow_commands: SharedString,
    pub label: SharedString,
    pub label_x: f32,
    pub label_y: f32,
    /// Label text starts at the label point instead of centring on it.
    pub label_at_start: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionTypeRow {
    pub id: SharedString,
    pub label: SharedString,
}

/// Shared editor state plus the models bound by the UI.
///
/// Clone this controller to share it across callbacks. Every mutating call
/// resyncs the models before returning.
#[derive(Clone)]
pub struct EditorController {
    workspace: Rc<RefCell<Workspace>>,
    annotations: Rc<VecModel<AnnotationRow>>,
    segments: Rc<VecModel<SegmentRow>>,
    nodes: Rc<VecModel<NodeRow>>,
    edges: Rc<VecModel<EdgeRow>>,
    connection_types: Rc<VecModel<ConnectionTypeRow>>,
}

impl Default for EditorController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorController {
    pub fn new(config: EditorConfig) -> Self {
        let ctrl = Self {
            workspace: Rc::new(RefCell::new(Workspace::new(config))),
            annotations: Rc::new(VecModel::default()),
            segments: Rc::new(VecModel::default()),
            nodes: Rc::new(VecModel::default()),
            edges: Rc::new(VecModel::default()),
            connection_types: Rc::new(VecModel::default()),
        };
        ctrl.sync();
        ctrl
    }

    /// Shared access to the underlying workspace.
    pub fn workspace(&self) -> Rc<RefCell<Workspace>> {
        self.workspace.clone()
    }

    /// Run `f` against the workspace, then resync every model.
    pub fn update<R>(&self, f: impl FnOnce(&mut Workspace) -> R) -> R {
        let result = {
            let mut ws = self.workspace.borrow_mut();
            f(&mut *ws)
        };
        self.sync();
        result
    }

    // === Models ===

    pub fn annotations_model(&self) -> ModelRc<AnnotationRow> {
        self.annotations.clone().into()
    }

    pub fn segments_model(&self) -> ModelRc<SegmentRow> {
        self.segments.clone().into()
    }

    pub fn nodes_model(&self) -> ModelRc<NodeRow> {
        self.nodes.clone().into()
    }

    pub fn edges_model(&self) -> ModelRc<EdgeRow> {
        self.edges.clone().into()
    }

    pub fn connection_types_model(&self) -> ModelRc<ConnectionTypeRow> {
        self.connection_types.clone().into()
    }

    /// Current `(scale, translate_x, translate_y)` of the graph layer.
    pub fn viewport(&self) -> (f32, f32, f32) {
        let transform = self.workspace.borrow().viewport().transform();
        (transform.scale, transform.translate_x, transform.translate_y)
    }

    /// Queued notice messages, oldest first.
    pub fn take_notices(&self) -> Vec<SharedString> {
        self.workspace
            .borrow_mut()
            .take_notices()
            .into_iter()
            .map(|notice| notice.message.into())
            .collect()
    }

    /// Message of the current session failure, empty when there is none.
    pub fn failure_message(&self) -> SharedString {
        self.workspace
            .borrow()
            .failure()
            .map(|failure| SharedString::from(failure.message.as_str()))
            .unwrap_or_default()
    }

    // === Commands ===

    pub fn new_session_from_text(&self, text: &str) -> Result<(), EditorError> {
        self.update(|ws| ws.new_session_from_text(text))
    }

    pub fn load_session(&self, json: &str) -> Result<(), EditorError> {
        self.update(|ws| ws.load_session(json))
    }

    pub fn save_session(&self) -> Result<SharedString, EditorError> {
        self.update(|ws| ws.save_session()).map(SharedString::from)
    }

    pub fn reset(&self) {
        self.update(Workspace::reset);
    }

    pub fn add_connection_type(&self, label: &str) -> Result<(), EditorError> {
        self.update(|ws| ws.add_connection_type(label)).map(|_| ())
    }

    pub fn rename_connection_type(&self, id: &str, label: &str) -> Result<(), EditorError> {
        let id = ConnectionTypeId::from_raw(id);
        self.update(|ws| ws.rename_connection_type(&id, label)).map(|_| ())
    }

    pub fn delete_connection_type(&self, id: &str) -> Result<(), EditorError> {
        let id = ConnectionTypeId::from_raw(id);
        self.update(|ws| ws.delete_connection_type(&id)).map(|_| ())
    }

    // === Text surface handlers ===

    /// A native selection finished over `[start, end)`.
    pub fn handle_text_selected(&self, start: i32, end: i32, anchor: Rect, container: Rect) {
        let range = SelectionRange::new(offset(start), offset(end));
        self.dispatch(InteractionEvent::TextSelected {
            range,
            anchor,
            container,
        });
    }

    pub fn handle_annotation_clicked(&self, id: &str, anchor: Rect, container: Rect) {
        self.dispatch(InteractionEvent::AnnotationClicked {
            id: AnnotationId::from_raw(id),
            anchor,
            container,
        });
    }

    /// A click inside the text with no selection. Resolves to the innermost
    /// annotation under `offset`; clicks on plain text are ignored.
    pub fn handle_text_clicked(&self, offset_in_text: i32, anchor: Rect, container: Rect) {
        let id = self
            .workspace
            .borrow()
            .annotation_at(offset(offset_in_text))
            .map(|ann| ann.id.clone());
        if let Some(id) = id {
            self.dispatch(InteractionEvent::AnnotationClicked { id, anchor, container });
        }
    }

    pub fn handle_selection_cleared(&self) {
        self.dispatch(InteractionEvent::SelectionCleared);
    }

    fn dispatch(&self, event: InteractionEvent) {
        if let Err(err) = self.update(|ws| ws.handle_interaction(event)) {
            debug!("interaction rejected: {err}");
        }
    }

    // === Callback factories ===

    /// Returns a callback for `tool-chosen(kind, value)`.
    pub fn tool_chosen_callback(&self) -> impl Fn(SharedString, SharedString) {
        let ctrl = self.clone();
        move |kind, value| match parse_style(&kind, &value) {
            Some(style) => ctrl.dispatch(InteractionEvent::ToolChosen(style)),
            None => debug!("unknown tool {kind}/{value}"),
        }
    }

    /// Returns a callback for `connection-type-chosen(label)`.
    pub fn connection_type_chosen_callback(&self) -> impl Fn(SharedString) {
        let ctrl = self.clone();
        move |label| ctrl.dispatch(InteractionEvent::ConnectionTypeChosen(label.to_string()))
    }

    /// Returns a callback for `key-pressed(text, editing-text)`.
    pub fn key_pressed_callback(&self) -> impl Fn(SharedString, bool) {
        let ctrl = self.clone();
        move |text, editing_text| {
            ctrl.dispatch(InteractionEvent::KeyPressed {
                key: key_from_text(&text),
                editing_text,
            })
        }
    }

    /// Returns a callback for `note-edited(id, note)`.
    pub fn note_edited_callback(&self) -> impl Fn(SharedString, SharedString) {
        let ctrl = self.clone();
        move |id, note| {
            let id = AnnotationId::from_raw(id.as_str());
            if let Err(err) = ctrl.update(|ws| ws.update_note(&id, note.as_str())) {
                debug!("note edit rejected: {err}");
            }
        }
    }

    /// Returns a callback for `delete-annotation(id)` from the sidebar.
    pub fn delete_annotation_callback(&self) -> impl Fn(SharedString) {
        let ctrl = self.clone();
        move |id| {
            let id = AnnotationId::from_raw(id.as_str());
            if let Err(err) = ctrl.update(|ws| ws.delete_annotation(&id)) {
                debug!("delete rejected: {err}");
            }
        }
    }

    /// Returns a callback for `toggle-graph()`, yielding the new visibility.
    pub fn toggle_graph_callback(&self) -> impl Fn() -> bool {
        let ctrl = self.clone();
        move || ctrl.update(Workspace::toggle_graph_view)
    }

    /// Returns a callback for `graph-resized(width, height)`.
    pub fn graph_resized_callback(&self) -> impl Fn(f32, f32) {
        let workspace = self.workspace.clone();
        move |width, height| workspace.borrow_mut().set_container_size(width, height)
    }

    /// Returns a callback for `graph-wheel(x, y, delta-y)`.
    pub fn graph_wheel_callback(&self) -> impl Fn(f32, f32, f32) -> bool {
        let workspace = self.workspace.clone();
        move |x, y, delta_y| workspace.borrow_mut().graph_wheel(x, y, delta_y)
    }

    /// Returns a callback for `graph-pointer-down(x, y)`, yielding the
    /// pressed node id or an empty string.
    pub fn graph_pointer_down_callback(&self) -> impl Fn(f32, f32) -> SharedString {
        let workspace = self.workspace.clone();
        move |x, y| {
            workspace
                .borrow_mut()
                .graph_pointer_down(x, y)
                .map(|id| SharedString::from(id.as_str()))
                .unwrap_or_default()
        }
    }

    /// Returns a callback for `graph-pointer-move(x, y)`.
    ///
    /// Only node and edge rows are rebuilt while dragging.
    pub fn graph_pointer_move_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            let (moved, dragging) = {
                let mut ws = ctrl.workspace.borrow_mut();
                let moved = ws.graph_pointer_move(x, y);
                (moved, ws.viewport().dragged_node().is_some())
            };
            if moved && dragging {
                ctrl.sync_graph();
            }
        }
    }

    /// Returns a callback for `graph-pointer-up()`. Also use it for
    /// pointer-leave.
    pub fn graph_pointer_up_callback(&self) -> impl Fn() {
        let workspace = self.workspace.clone();
        move || workspace.borrow_mut().graph_pointer_up()
    }

    // === Model sync ===

    /// Rebuild every model from the workspace.
    pub fn sync(&self) {
        {
            let ws = self.workspace.borrow();
            self.annotations.set_vec(annotation_rows(&ws));
            self.segments.set_vec(segment_rows(&ws));
            self.connection_types.set_vec(
                ws.connection_types()
                    .iter()
                    .map(|ty| ConnectionTypeRow {
                        id: ty.id.as_str().into(),
                        label: ty.label.as_str().into(),
                    })
                    .collect::<Vec<_>>(),
            );
        }
        self.sync_graph();
    }

    /// Rebuild the node and edge models only.
    pub fn sync_graph(&self) {
        let ws = self.workspace.borrow();
        self.nodes.set_vec(node_rows(&ws));
        self.edges.set_vec(
            ws.edges()
                .into_iter()
                .map(|edge| EdgeRow {
                    id: edge.connection_id.as_str().into(),
                    path_commands: edge.line_commands().into(),
                    arrow_commands: edge.arrow_commands().into(),
                    label: edge.label.as_str().into(),
                    label_x: edge.label_pos.0,
                    label_y: edge.label_pos.1,
                    label_at_start: edge.label_anchor == crate::edges::LabelAnchor::Start,
                })
                .collect::<Vec<_>>(),
        );
    }
}

fn annotation_rows(ws: &Workspace) -> Vec<AnnotationRow> {
    let focused = ws.interaction().focused();
    ws.annotations()
        .iter()
        .map(|ann| AnnotationRow {
            id: ann.id.as_str().into(),
            start: ann.start as i32,
            end: ann.end as i32,
            text: ann.text.as_str().into(),
            note: ann.note.as_str().into(),
            kind: match ann.kind() {
                AnnotationKind::Highlight => "highlight".into(),
                AnnotationKind::Symbol => "symbol".into(),
            },
            value: ann.style.value().into(),
            fill: ann.style.fill(),
            focused: focused == Some(&ann.id),
            connection_count: ws.connections().iter().filter(|c| c.touches(&ann.id)).count() as i32,
        })
        .collect()
}

fn segment_rows(ws: &Workspace) -> Vec<SegmentRow> {
    ws.segments()
        .into_iter()
        .map(|segment| {
            let innermost = segment.annotations.first();
            let indicator = segment_indicators(&segment);
            SegmentRow {
                start: segment.start as i32,
                end: segment.end as i32,
                text: segment.text.into(),
                annotated: innermost.is_some(),
                fill: innermost.map(|ann| ann.style.fill()).unwrap_or_default(),
                annotation_id: innermost.map(|ann| ann.id.as_str().into()).unwrap_or_default(),
                indicator: indicator.into(),
                depth: segment.annotations.len() as i32,
            }
        })
        .collect()
}

fn node_rows(ws: &Workspace) -> Vec<NodeRow> {
    let layout = ws.layout();
    layout
        .nodes
        .iter()
        .map(|node| {
            let ann = ws.annotation(&node.annotation_id);
            NodeRow {
                id: node.annotation_id.as_str().into(),
                label: ann.map(|ann| ann.text.as_str().into()).unwrap_or_default(),
                note: ann.map(|ann| ann.note.as_str().into()).unwrap_or_default(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                fill: ann.map(|ann| ann.style.fill()).unwrap_or_default(),
                is_main: layout.main.as_ref() == Some(&node.annotation_id),
            }
        })
        .collect()
}

fn offset(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn parse_style(kind: &str, value: &str) -> Option<AnnotationStyle> {
    let kind = match kind {
        "highlight" => AnnotationKind::Highlight,
        "symbol" => AnnotationKind::Symbol,
        _ => return None,
    };
    AnnotationStyle::from_parts(kind, value)
}

/// Map a Slint key event text (or a key name) to a [`Key`].
fn key_from_text(text: &str) -> Key {
    match text {
        "\u{1b}" | "Escape" => Key::Escape,
        "\u{7f}" | "Delete" => Key::Delete,
        "\u{8}" | "Backspace" => Key::Backspace,
        _ => Key::Other,
    }
}
