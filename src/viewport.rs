//! Pan, zoom and node dragging over the laid-out graph.
//!
//! Screen coordinates are relative to the graph surface's top-left corner.
//! Graph coordinates are the layout's coordinates, with the main node at the
//! origin. `screen = graph * scale + translate`.

use crate::hit_test::find_node_at;
use crate::layout::GraphNode;
use crate::model::AnnotationId;
use log::debug;
use serde::{Deserialize, Serialize};

/// Zoom limits and step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Scale multiplier per wheel tick.
    pub zoom_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_factor: 1.1,
            min_scale: 0.1,
            max_scale: 3.0,
        }
    }
}

/// Transform applied to the whole node and edge layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewportTransform {
    pub fn new(scale: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    pub fn screen_to_graph(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.translate_x) / self.scale,
            (y - self.translate_y) / self.scale,
        )
    }

    pub fn graph_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        )
    }

    /// Zoom one wheel tick about the cursor, keeping the graph point under it
    /// fixed. Negative `delta_y` zooms in. Returns `false` when nothing
    /// changed.
    pub fn zoom_at(&mut self, cursor_x: f32, cursor_y: f32, delta_y: f32, config: &ViewportConfig) -> bool {
        if delta_y == 0.0 {
            return false;
        }
        let target = if delta_y < 0.0 {
            self.scale * config.zoom_factor
        } else {
            self.scale / config.zoom_factor
        };
        // Not `clamp`: an inverted range must not panic
        let new_scale = target.max(config.min_scale).min(config.max_scale);
        if new_scale == self.scale {
            return false;
        }
        let ratio = new_scale / self.scale;
        self.translate_x = cursor_x - (cursor_x - self.translate_x) * ratio;
        self.translate_y = cursor_y - (cursor_y - self.translate_y) * ratio;
        self.scale = new_scale;
        true
    }
}

/// The gesture in progress. Panning and node dragging never overlap.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// `origin` is the press point minus the translate at press time.
    Panning { origin_x: f32, origin_y: f32 },
    /// Offset from the cursor to the node centre, in graph space.
    DraggingNode {
        id: AnnotationId,
        offset_x: f32,
        offset_y: f32,
    },
}

/// Pointer-driven viewport state for one graph surface.
#[derive(Clone, Debug, Default)]
pub struct ViewportInteraction {
    transform: ViewportTransform,
    gesture: Gesture,
    config: ViewportConfig,
}

impl ViewportInteraction {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    /// Replace the transform, e.g. with an auto-fit result. Ends any gesture.
    pub fn set_transform(&mut self, transform: ViewportTransform) {
        self.transform = transform;
        self.gesture = Gesture::Idle;
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn dragged_node(&self) -> Option<&AnnotationId> {
        match &self.gesture {
            Gesture::DraggingNode { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    pub fn wheel(&mut self, cursor_x: f32, cursor_y: f32, delta_y: f32) -> bool {
        self.transform.zoom_at(cursor_x, cursor_y, delta_y, &self.config)
    }

    /// Start a gesture: a node drag when the press lands on a node, a pan
    /// otherwise. Returns the pressed node, if any.
    pub fn pointer_down(&mut self, x: f32, y: f32, nodes: &[GraphNode]) -> Option<AnnotationId> {
        let (gx, gy) = self.transform.screen_to_graph(x, y);
        match find_node_at(gx, gy, nodes) {
            Some(node) => {
                debug!("drag start on node {}", node.annotation_id);
                self.gesture = Gesture::DraggingNode {
                    id: node.annotation_id.clone(),
                    offset_x: gx - node.x,
                    offset_y: gy - node.y,
                };
                Some(node.annotation_id.clone())
            }
            None => {
                self.gesture = Gesture::Panning {
                    origin_x: x - self.transform.translate_x,
                    origin_y: y - self.transform.translate_y,
                };
                None
            }
        }
    }

    /// Continue the current gesture. Returns `true` when the transform or a
    /// node position changed.
    pub fn pointer_move(&mut self, x: f32, y: f32, nodes: &mut [GraphNode]) -> bool {
        match &self.gesture {
            Gesture::Idle => false,
            Gesture::Panning { origin_x, origin_y } => {
                self.transform.translate_x = x - origin_x;
                self.transform.translate_y = y - origin_y;
                true
            }
            Gesture::DraggingNode { id, offset_x, offset_y } => {
                let (gx, gy) = self.transform.screen_to_graph(x, y);
                match nodes.iter_mut().find(|node| &node.annotation_id == id) {
                    Some(node) => {
                        node.x = gx - offset_x;
                        node.y = gy - offset_y;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Leaving the surface ends the gesture like a release.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f32, y: f32) -> GraphNode {
        GraphNode {
            annotation_id: AnnotationId::from_raw(id),
            x,
            y,
            width: 160.0,
            height: 90.0,
        }
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }

    // ========================================================================
    // ViewportTransform
    // ========================================================================

    #[test]
    fn test_screen_graph_conversion() {
        let t = ViewportTransform::new(2.0, 100.0, 50.0);
        assert_eq!(t.screen_to_graph(300.0, 250.0), (100.0, 100.0));
        assert_eq!(t.graph_to_screen(100.0, 100.0), (300.0, 250.0));
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let config = ViewportConfig::default();
        let mut t = ViewportTransform::new(0.8, 400.0, 300.0);
        let (cx, cy) = (123.0, 456.0);
        let before = t.screen_to_graph(cx, cy);
        assert!(t.zoom_at(cx, cy, -1.0, &config));
        let after = t.screen_to_graph(cx, cy);
        assert_close(before.0, after.0);
        assert_close(before.1, after.1);
        assert_close(t.scale, 0.88);

        assert!(t.zoom_at(cx, cy, 1.0, &config));
        assert_close(t.scale, 0.8);
    }

    #[test]
    fn test_zoom_clamps_to_range() {
        let config = ViewportConfig::default();
        let mut t = ViewportTransform::new(2.9, 0.0, 0.0);
        assert!(t.zoom_at(0.0, 0.0, -1.0, &config));
        assert_eq!(t.scale, 3.0);
        assert!(!t.zoom_at(0.0, 0.0, -1.0, &config));

        let mut t = ViewportTransform::new(0.1, 0.0, 0.0);
        assert!(!t.zoom_at(0.0, 0.0, 1.0, &config));
    }

    #[test]
    fn test_zoom_with_inverted_range_settles_on_max() {
        let config = ViewportConfig {
            zoom_factor: 1.1,
            min_scale: 4.0,
            max_scale: 2.0,
        };
        let mut t = ViewportTransform::default();
        assert!(t.zoom_at(10.0, 10.0, -1.0, &config));
        assert_eq!(t.scale, 2.0);
        assert!(!t.zoom_at(10.0, 10.0, 1.0, &config));
    }

    #[test]
    fn test_zoom_ignores_zero_delta() {
        let mut t = ViewportTransform::default();
        assert!(!t.zoom_at(10.0, 10.0, 0.0, &ViewportConfig::default()));
        assert_eq!(t, ViewportTransform::default());
    }

    // ========================================================================
    // Gestures
    // ========================================================================

    #[test]
    fn test_background_press_pans() {
        let mut vp = ViewportInteraction::default();
        vp.set_transform(ViewportTransform::new(1.0, 400.0, 300.0));
        let mut nodes = vec![node("a", 0.0, 0.0)];

        assert_eq!(vp.pointer_down(10.0, 10.0, &nodes), None);
        assert!(vp.is_panning());
        assert!(vp.pointer_move(30.0, 5.0, &mut nodes));
        assert_eq!(vp.transform().translate_x, 420.0);
        assert_eq!(vp.transform().translate_y, 295.0);
        // Nodes stay put while panning
        assert_eq!((nodes[0].x, nodes[0].y), (0.0, 0.0));

        vp.pointer_up();
        assert!(!vp.pointer_move(90.0, 90.0, &mut nodes));
    }

    #[test]
    fn test_node_press_drags_with_offset() {
        let mut vp = ViewportInteraction::default();
        vp.set_transform(ViewportTransform::new(2.0, 400.0, 300.0));
        let mut nodes = vec![node("a", 0.0, 0.0), node("b", 350.0, 0.0)];

        // Graph point (10, 5) is inside node a
        let pressed = vp.pointer_down(420.0, 310.0, &nodes);
        assert_eq!(pressed, Some(AnnotationId::from_raw("a")));
        assert_eq!(vp.dragged_node().unwrap().as_str(), "a");

        assert!(vp.pointer_move(440.0, 330.0, &mut nodes));
        assert_eq!((nodes[0].x, nodes[0].y), (10.0, 10.0));
        assert_eq!((nodes[1].x, nodes[1].y), (350.0, 0.0));
        assert_eq!(vp.transform(), ViewportTransform::new(2.0, 400.0, 300.0));
    }

    #[test]
    fn test_pointer_leave_ends_drag() {
        let mut vp = ViewportInteraction::default();
        let mut nodes = vec![node("a", 0.0, 0.0)];
        vp.pointer_down(0.0, 0.0, &nodes);
        vp.pointer_leave();
        assert_eq!(vp.gesture(), &Gesture::Idle);
        assert!(!vp.pointer_move(50.0, 50.0, &mut nodes));
        assert_eq!((nodes[0].x, nodes[0].y), (0.0, 0.0));
    }

    #[test]
    fn test_drag_of_removed_node_is_noop() {
        let mut vp = ViewportInteraction::default();
        let nodes = vec![node("a", 0.0, 0.0)];
        vp.pointer_down(0.0, 0.0, &nodes);
        let mut empty: Vec<GraphNode> = Vec::new();
        assert!(!vp.pointer_move(5.0, 5.0, &mut empty));
    }
}
