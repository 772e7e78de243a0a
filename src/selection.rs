//! Text selection and floating toolbar state.
//!
//! [`InteractionController`] turns raw UI events (a text selection, a click
//! on an annotation, a key press) into [`Command`]s for the workspace. It
//! never mutates annotations itself, so it can be tested without a document.

use crate::model::{AnnotationId, AnnotationStyle, SelectionRange};
use serde::{Deserialize, Serialize};

/// Screen rectangle, e.g. a selection's or an annotation's bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// Position of a floating toolbar relative to the scrollable container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolbarPlacement {
    pub top: f32,
    /// Horizontal centre of the anchor.
    pub left: f32,
    /// Width of the anchor the toolbar belongs to.
    pub width: f32,
}

/// Place a toolbar `offset` pixels above `anchor`, horizontally centred on it.
pub fn place_toolbar(anchor: Rect, container: Rect, offset: f32) -> ToolbarPlacement {
    ToolbarPlacement {
        top: anchor.y - container.y - offset,
        left: anchor.x - container.x + anchor.width / 2.0,
        width: anchor.width,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Other,
}

/// Input events understood by the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    /// A native selection finished. A collapsed range counts as cleared.
    TextSelected {
        range: SelectionRange,
        anchor: Rect,
        container: Rect,
    },
    SelectionCleared,
    /// A style picked from the quick toolbar.
    ToolChosen(AnnotationStyle),
    AnnotationClicked {
        id: AnnotationId,
        anchor: Rect,
        container: Rect,
    },
    /// A connection type picked from the action toolbar.
    ConnectionTypeChosen(String),
    KeyPressed {
        key: Key,
        /// Focus is inside a note or label field.
        editing_text: bool,
    },
}

/// Mutations requested from the workspace.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CreateAnnotation {
        style: AnnotationStyle,
        range: SelectionRange,
    },
    BeginConnection {
        from: AnnotationId,
        connection_type: String,
    },
    CompleteConnection {
        to: AnnotationId,
    },
    CancelConnection,
    DeleteAnnotation(AnnotationId),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    SelectionPending {
        range: SelectionRange,
        toolbar: ToolbarPlacement,
    },
    AnnotationFocused {
        id: AnnotationId,
        toolbar: ToolbarPlacement,
    },
    ConnectionPending {
        from: AnnotationId,
        connection_type: String,
    },
}

/// Toolbar offsets above their anchors, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    pub quick: f32,
    pub action: f32,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            quick: 50.0,
            action: 60.0,
        }
    }
}

/// Reducer over [`InteractionEvent`]s.
///
/// Besides the state proper it remembers the last focused annotation: closing
/// the toolbars with Escape leaves that annotation the target of Delete.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    state: InteractionState,
    focused: Option<AnnotationId>,
    toolbar: ToolbarConfig,
}

impl InteractionController {
    pub fn new(toolbar: ToolbarConfig) -> Self {
        Self {
            toolbar,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn focused(&self) -> Option<&AnnotationId> {
        self.focused.as_ref()
    }

    pub fn pending_selection(&self) -> Option<SelectionRange> {
        match &self.state {
            InteractionState::SelectionPending { range, .. } => Some(*range),
            _ => None,
        }
    }

    pub fn quick_toolbar(&self) -> Option<ToolbarPlacement> {
        match &self.state {
            InteractionState::SelectionPending { toolbar, .. } => Some(*toolbar),
            _ => None,
        }
    }

    pub fn action_toolbar(&self) -> Option<(&AnnotationId, ToolbarPlacement)> {
        match &self.state {
            InteractionState::AnnotationFocused { id, toolbar } => Some((id, *toolbar)),
            _ => None,
        }
    }

    pub fn is_connection_pending(&self) -> bool {
        matches!(self.state, InteractionState::ConnectionPending { .. })
    }

    /// Apply one event and return the commands it triggers.
    pub fn handle(&mut self, event: InteractionEvent) -> Vec<Command> {
        let state = std::mem::take(&mut self.state);
        let (next, commands) = self.transition(state, event);
        self.state = next;
        commands
    }

    fn transition(&mut self, state: InteractionState, event: InteractionEvent) -> (InteractionState, Vec<Command>) {
        use InteractionEvent as E;
        use InteractionState as S;

        match (state, event) {
            // A pending connection waits for a target click; selections are ignored
            (pending @ S::ConnectionPending { .. }, E::TextSelected { .. } | E::SelectionCleared | E::ToolChosen(_)) => {
                (pending, vec![])
            }
            (_, E::TextSelected { range, anchor, container }) if range.is_active() => {
                let toolbar = place_toolbar(anchor, container, self.toolbar.quick);
                (S::SelectionPending { range, toolbar }, vec![])
            }
            (S::SelectionPending { .. }, E::TextSelected { .. } | E::SelectionCleared) => (S::Idle, vec![]),
            (state, E::TextSelected { .. } | E::SelectionCleared) => (state, vec![]),

            (S::SelectionPending { range, .. }, E::ToolChosen(style)) => {
                (S::Idle, vec![Command::CreateAnnotation { style, range }])
            }
            (state, E::ToolChosen(_)) => (state, vec![]),

            (S::ConnectionPending { .. }, E::AnnotationClicked { id, .. }) => {
                (S::Idle, vec![Command::CompleteConnection { to: id }])
            }
            (S::AnnotationFocused { id: current, .. }, E::AnnotationClicked { id, .. }) if current == id => {
                self.focused = None;
                (S::Idle, vec![])
            }
            (_, E::AnnotationClicked { id, anchor, container }) => {
                let toolbar = place_toolbar(anchor, container, self.toolbar.action);
                self.focused = Some(id.clone());
                (S::AnnotationFocused { id, toolbar }, vec![])
            }

            (S::AnnotationFocused { id, .. }, E::ConnectionTypeChosen(connection_type)) => (
                S::ConnectionPending {
                    from: id.clone(),
                    connection_type: connection_type.clone(),
                },
                vec![Command::BeginConnection { from: id, connection_type }],
            ),
            (state, E::ConnectionTypeChosen(_)) => (state, vec![]),

            (S::ConnectionPending { .. }, E::KeyPressed { key: Key::Escape, .. }) => {
                (S::Idle, vec![Command::CancelConnection])
            }
            (_, E::KeyPressed { key: Key::Escape, .. }) => (S::Idle, vec![]),

            (state, E::KeyPressed { key: Key::Delete | Key::Backspace, editing_text }) => {
                if editing_text {
                    return (state, vec![]);
                }
                match self.focused.take() {
                    Some(id) => (S::Idle, vec![Command::DeleteAnnotation(id)]),
                    None => (state, vec![]),
                }
            }
            (state, E::KeyPressed { key: Key::Other, .. }) => (state, vec![]),
        }
    }

    /// Forget any reference to an annotation removed elsewhere (e.g. from the
    /// sidebar).
    pub fn annotation_removed(&mut self, id: &AnnotationId) {
        if self.focused.as_ref() == Some(id) {
            self.focused = None;
        }
        let stale = match &self.state {
            InteractionState::AnnotationFocused { id: current, .. } => current == id,
            InteractionState::ConnectionPending { from, .. } => from == id,
            _ => false,
        };
        if stale {
            self.state = InteractionState::Idle;
        }
    }

    /// Leave pending-connection mode without a command, e.g. after the
    /// workspace cancelled it directly.
    pub fn connection_cancelled(&mut self) {
        if self.is_connection_pending() {
            self.state = InteractionState::Idle;
        }
    }

    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
        self.focused = None;
    }
}
