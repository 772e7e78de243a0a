//! Geometry of connection edges in the graph view.
//!
//! Edges are straight directed lines between node centres, ending at the
//! border of the target node so the arrow head stays visible. Everything
//! here is recomputed from current node positions, so dragged nodes carry
//! their edges along.

use serde::{Deserialize, Serialize};

use crate::layout::GraphNode;
use crate::model::{AnnotationId, Connection, ConnectionId};

/// Edge label and arrow constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyle {
    /// Distance of the label from the edge midpoint.
    pub label_offset: f32,
    /// An edge is vertical-ish when `|dy| > |dx| * vertical_ratio`.
    pub vertical_ratio: f32,
    pub arrow_length: f32,
    pub arrow_half_width: f32,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            label_offset: 25.0,
            vertical_ratio: 0.8,
            arrow_length: 10.0,
            arrow_half_width: 5.0,
        }
    }
}

/// Horizontal text alignment of an edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAnchor {
    /// Text starts at the label point (label beside a vertical-ish edge).
    Start,
    /// Text is centred on the label point (label above the edge).
    Middle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    pub connection_id: ConnectionId,
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub label: String,
    pub label_pos: (f32, f32),
    pub label_anchor: LabelAnchor,
    /// Tip, left base corner, right base corner.
    pub arrow: [(f32, f32); 3],
}

impl EdgeGeometry {
    /// SVG path commands for the edge line
    pub fn line_commands(&self) -> String {
        format!(
            "M {} {} L {} {}",
            self.start.0, self.start.1, self.end.0, self.end.1
        )
    }

    /// SVG path commands for the closed arrow head
    pub fn arrow_commands(&self) -> String {
        let [tip, left, right] = self.arrow;
        format!(
            "M {} {} L {} {} L {} {} Z",
            tip.0, tip.1, left.0, left.1, right.0, right.1
        )
    }
}

/// Label position for an edge between two centres.
///
/// Vertical-ish edges get their label to the right of the midpoint; all
/// others get it above.
pub fn label_placement(from: (f32, f32), to: (f32, f32), style: &EdgeStyle) -> ((f32, f32), LabelAnchor) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let mid = (from.0 + dx / 2.0, from.1 + dy / 2.0);
    if dy.abs() > dx.abs() * style.vertical_ratio {
        ((mid.0 + style.label_offset, mid.1), LabelAnchor::Start)
    } else {
        ((mid.0, mid.1 - style.label_offset), LabelAnchor::Middle)
    }
}

/// Where the segment from the target's centre toward `from` leaves the
/// target's rectangle. Overlapping nodes keep the centre.
fn clip_to_node(from: (f32, f32), target: &GraphNode) -> (f32, f32) {
    let (dx, dy) = (from.0 - target.x, from.1 - target.y);
    let tx = if dx == 0.0 { f32::INFINITY } else { (target.width / 2.0) / dx.abs() };
    let ty = if dy == 0.0 { f32::INFINITY } else { (target.height / 2.0) / dy.abs() };
    let t = tx.min(ty);
    if t >= 1.0 {
        (target.x, target.y)
    } else {
        (target.x + dx * t, target.y + dy * t)
    }
}

fn arrow_head(start: (f32, f32), tip: (f32, f32), style: &EdgeStyle) -> [(f32, f32); 3] {
    let (dx, dy) = (tip.0 - start.0, tip.1 - start.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len < f32::EPSILON {
        return [tip; 3];
    }
    let (ux, uy) = (dx / len, dy / len);
    let base = (tip.0 - ux * style.arrow_length, tip.1 - uy * style.arrow_length);
    let (px, py) = (-uy * style.arrow_half_width, ux * style.arrow_half_width);
    [tip, (base.0 + px, base.1 + py), (base.0 - px, base.1 - py)]
}

/// Geometry for one connection between two laid-out nodes.
pub fn edge_geometry(connection: &Connection, from: &GraphNode, to: &GraphNode, style: &EdgeStyle) -> EdgeGeometry {
    let start = (from.x, from.y);
    let centre = (to.x, to.y);
    let end = clip_to_node(start, to);
    let (label_pos, label_anchor) = label_placement(start, centre, style);
    EdgeGeometry {
        connection_id: connection.id.clone(),
        start,
        end,
        label: connection.connection_type.clone(),
        label_pos,
        label_anchor,
        arrow: arrow_head(start, end, style),
    }
}

/// Geometry for every connection whose endpoints are both laid out.
pub fn edge_geometries(connections: &[Connection], nodes: &[GraphNode], style: &EdgeStyle) -> Vec<EdgeGeometry> {
    let find = |id: &AnnotationId| nodes.iter().find(|node| &node.annotation_id == id);
    connections
        .iter()
        .filter_map(|conn| Some(edge_geometry(conn, find(&conn.from)?, find(&conn.to)?, style)))
        .collect()
}

/// Squared distance from `point` to the segment `a`-`b`.
fn distance_to_segment_sq(point: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq < f32::EPSILON {
        0.0
    } else {
        (((point.0 - a.0) * dx + (point.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    (point.0 - cx).powi(2) + (point.1 - cy).powi(2)
}

/// Find the edge closest to a graph-space point within `hover_distance`.
pub fn find_edge_at(x: f32, y: f32, edges: &[EdgeGeometry], hover_distance: f32) -> Option<&ConnectionId> {
    let mut closest = None;
    let mut closest_sq = hover_distance * hover_distance;
    for edge in edges {
        let dist_sq = distance_to_segment_sq((x, y), edge.start, edge.end);
        if dist_sq <= closest_sq {
            closest_sq = dist_sq;
            closest = Some(&edge.connection_id);
        }
    }
    closest
}
