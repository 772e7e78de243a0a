//! Radial layout of the annotation graph.
//!
//! The best-connected annotation sits at the origin and every other
//! annotation is spread evenly on a circle around it. Layout is a pure
//! function of the annotation and connection sets; positions it produces may
//! be dragged freely until the next recompute replaces them.

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{char_len, Annotation, AnnotationId, Connection};
use crate::viewport::ViewportTransform;

/// Sizing and spacing constants for [`radial_layout`] and [`fit_viewport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialLayoutConfig {
    pub base_width: f32,
    pub base_height: f32,
    /// Extra height per additional label line.
    pub line_height: f32,
    pub chars_per_line: usize,
    /// Lines that fit in the base height.
    pub base_lines: usize,
    /// Gap reserved between neighbouring nodes on the circle.
    pub node_padding: f32,
    pub min_radius: f32,
    /// Fraction of the container the fitted graph may use.
    pub fit_margin: f32,
    pub min_fit_scale: f32,
    pub max_fit_scale: f32,
}

impl Default for RadialLayoutConfig {
    fn default() -> Self {
        Self {
            base_width: 160.0,
            base_height: 90.0,
            line_height: 20.0,
            chars_per_line: 25,
            base_lines: 2,
            node_padding: 40.0,
            min_radius: 350.0,
            fit_margin: 0.9,
            min_fit_scale: 0.1,
            max_fit_scale: 1.0,
        }
    }
}

impl RadialLayoutConfig {
    /// Width of one slot on the circle: a base node plus padding.
    pub fn node_spacing(&self) -> f32 {
        self.base_width + self.node_padding
    }
}

/// A laid-out annotation. `x`/`y` are the node centre in graph space.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub annotation_id: AnnotationId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Result of [`radial_layout`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphLayout {
    /// Main node first, then sub-nodes in annotation order.
    pub nodes: Vec<GraphNode>,
    pub main: Option<AnnotationId>,
    pub radius: f32,
}

impl GraphLayout {
    pub fn node(&self, id: &AnnotationId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| &node.annotation_id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Node size for a label of `text`: fixed width, one extra line of height
/// for every `chars_per_line` characters past the base lines.
pub fn node_dimensions(text: &str, config: &RadialLayoutConfig) -> (f32, f32) {
    let per_line = config.chars_per_line.max(1);
    let lines = char_len(text).div_ceil(per_line);
    let extra = lines.saturating_sub(config.base_lines);
    (
        config.base_width,
        config.base_height + extra as f32 * config.line_height,
    )
}

/// In + out degree of each annotation. Connections with an endpoint missing
/// from `annotations` are ignored.
pub fn degrees<'a>(annotations: &'a [Annotation], connections: &[Connection]) -> HashMap<&'a AnnotationId, usize> {
    let present: HashSet<&AnnotationId> = annotations.iter().map(|ann| &ann.id).collect();
    let mut counts: HashMap<&AnnotationId, usize> = annotations.iter().map(|ann| (&ann.id, 0)).collect();
    for conn in connections {
        if !present.contains(&conn.from) || !present.contains(&conn.to) {
            continue;
        }
        for id in [&conn.from, &conn.to] {
            if let Some(count) = counts.get_mut(id) {
                *count += 1;
            }
        }
    }
    counts
}

/// Highest-degree annotation; the earliest in `annotations` wins ties, so an
/// unconnected set picks its first annotation.
pub fn main_node<'a>(annotations: &'a [Annotation], connections: &[Connection]) -> Option<&'a AnnotationId> {
    let counts = degrees(annotations, connections);
    let mut best: Option<(&AnnotationId, usize)> = None;
    for ann in annotations {
        let degree = counts.get(&ann.id).copied().unwrap_or(0);
        if best.map_or(true, |(_, max)| degree > max) {
            best = Some((&ann.id, degree));
        }
    }
    best.map(|(id, _)| id)
}

/// Circle radius that fits `sub_count` nodes side by side, never below the
/// configured minimum.
pub fn layout_radius(sub_count: usize, config: &RadialLayoutConfig) -> f32 {
    let circumference = sub_count as f32 * config.node_spacing();
    (circumference / TAU).max(config.min_radius)
}

/// Place the main node at the origin and the rest on a circle around it,
/// starting at angle 0 and stepping `2π / sub_count`.
pub fn radial_layout(
    annotations: &[Annotation],
    connections: &[Connection],
    config: &RadialLayoutConfig,
) -> GraphLayout {
    let Some(main) = main_node(annotations, connections) else {
        return GraphLayout::default();
    };

    let subs: Vec<&Annotation> = annotations.iter().filter(|ann| &ann.id != main).collect();
    let radius = layout_radius(subs.len(), config);
    let step = if subs.is_empty() { 0.0 } else { TAU / subs.len() as f32 };

    let mut nodes = Vec::with_capacity(annotations.len());
    if let Some(main_ann) = annotations.iter().find(|ann| &ann.id == main) {
        let (width, height) = node_dimensions(&main_ann.text, config);
        nodes.push(GraphNode {
            annotation_id: main.clone(),
            x: 0.0,
            y: 0.0,
            width,
            height,
        });
    }
    for (index, ann) in subs.iter().enumerate() {
        let angle = index as f32 * step;
        let (width, height) = node_dimensions(&ann.text, config);
        nodes.push(GraphNode {
            annotation_id: ann.id.clone(),
            x: radius * angle.cos(),
            y: radius * angle.sin(),
            width,
            height,
        });
    }

    debug!(
        "radial layout: {} nodes, main {}, radius {:.1}",
        nodes.len(),
        main,
        radius
    );
    GraphLayout {
        nodes,
        main: Some(main.clone()),
        radius,
    }
}

/// Scale and centre a graph of `radius` inside a `width` x `height`
/// container. Returns `None` for a container with no area.
pub fn fit_viewport(radius: f32, width: f32, height: f32, config: &RadialLayoutConfig) -> Option<ViewportTransform> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let diameter = radius * 2.0 + config.node_spacing();
    let scale = (width / diameter).min(height / diameter) * config.fit_margin;
    Some(ViewportTransform::new(
        scale.max(config.min_fit_scale).min(config.max_fit_scale),
        width / 2.0,
        height / 2.0,
    ))
}
