//! Layered layout of the annotation graph.
//!
//! An alternative to the radial layout that arranges connected annotations
//! in layers following connection direction, using the Sugiyama algorithm
//! from the `rust-sugiyama` crate. The result is centred on the origin so it
//! can be fitted and dragged exactly like a radial layout.
//!
//! `rust-sugiyama` works in `f64`; positions are converted to `f32` for the
//! rest of the crate.
//!
//! Requires the `layout` feature to be enabled.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use log::debug;

use crate::layout::{main_node, node_dimensions, GraphLayout, GraphNode, RadialLayoutConfig};
use crate::model::{Annotation, AnnotationId, Connection};

/// Layout direction for the Sugiyama algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Direction {
    /// Layers flow top to bottom (default).
    #[default]
    TopToBottom,
    /// Layers flow left to right.
    LeftToRight,
}

/// Configuration for the layered layout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[non_exhaustive]
pub struct HierarchicalConfig {
    /// Minimum spacing between vertices (0.0 keeps the `rust-sugiyama`
    /// default).
    pub vertex_spacing: f64,
    /// Minimum edge length between layers (0 keeps the `rust-sugiyama`
    /// default).
    pub minimum_length: u32,
    pub direction: Direction,
}

impl HierarchicalConfig {
    pub fn with_direction(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}

/// Compute a layered layout of `annotations`.
///
/// Node sizes follow [`node_dimensions`]. Each connection contributes one
/// edge; dangling connections and repeated pairs are dropped.
pub fn hierarchical_layout(
    annotations: &[Annotation],
    connections: &[Connection],
    sizing: &RadialLayoutConfig,
    config: &HierarchicalConfig,
) -> GraphLayout {
    if annotations.is_empty() {
        return GraphLayout::default();
    }
    let horizontal = config.direction == Direction::LeftToRight;

    // Sequential u32 index per annotation, first occurrence wins
    let mut id_to_idx: HashMap<&AnnotationId, u32> = HashMap::new();
    let mut idx_to_ann: Vec<&Annotation> = Vec::with_capacity(annotations.len());
    for ann in annotations {
        if let Entry::Vacant(e) = id_to_idx.entry(&ann.id) {
            e.insert(idx_to_ann.len() as u32);
            idx_to_ann.push(ann);
        }
    }

    // Swap width/height for horizontal layouts so layers are spaced along x
    let vertices: Vec<(u32, (f64, f64))> = idx_to_ann
        .iter()
        .enumerate()
        .map(|(idx, ann)| {
            let (w, h) = node_dimensions(&ann.text, sizing);
            let size = if horizontal { (h, w) } else { (w, h) };
            (idx as u32, (size.0 as f64, size.1 as f64))
        })
        .collect();

    let edges: Vec<(u32, u32)> = connections
        .iter()
        .filter_map(|conn| {
            let src = *id_to_idx.get(&conn.from)?;
            let dst = *id_to_idx.get(&conn.to)?;
            (src != dst).then_some((src, dst))
        })
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut sg_config = rust_sugiyama::configure::Config {
        dummy_vertices: false,
        ..Default::default()
    };
    if config.vertex_spacing > 0.0 {
        sg_config.vertex_spacing = config.vertex_spacing;
    }
    if config.minimum_length > 0 {
        sg_config.minimum_length = config.minimum_length;
    }

    let subgraphs = rust_sugiyama::from_vertices_and_edges(&vertices, &edges, &sg_config);

    let mut positions: HashMap<usize, (f32, f32)> = HashMap::with_capacity(idx_to_ann.len());
    for (layout, _width, _height) in &subgraphs {
        for &(idx, (x, y)) in layout {
            let (px, py) = if horizontal { (y, x) } else { (x, y) };
            positions.insert(idx, (px as f32, py as f32));
        }
    }

    let mut nodes: Vec<GraphNode> = idx_to_ann
        .iter()
        .enumerate()
        .filter_map(|(idx, ann)| {
            let &(x, y) = positions.get(&idx)?;
            let (width, height) = node_dimensions(&ann.text, sizing);
            Some(GraphNode {
                annotation_id: ann.id.clone(),
                x,
                y,
                width,
                height,
            })
        })
        .collect();

    let radius = centre_on_origin(&mut nodes);
    debug!("hierarchical layout: {} nodes in {} subgraphs", nodes.len(), subgraphs.len());
    GraphLayout {
        nodes,
        main: main_node(annotations, connections).cloned(),
        radius,
    }
}

/// Shift nodes so their bounding box is centred on the origin. Returns half
/// the larger box side, usable as a fit radius.
fn centre_on_origin(nodes: &mut [GraphNode]) -> f32 {
    let Some(first) = nodes.first() else {
        return 0.0;
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for node in nodes.iter() {
        min_x = min_x.min(node.x - node.width / 2.0);
        max_x = max_x.max(node.x + node.width / 2.0);
        min_y = min_y.min(node.y - node.height / 2.0);
        max_y = max_y.max(node.y + node.height / 2.0);
    }
    let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    for node in nodes.iter_mut() {
        node.x -= cx;
        node.y -= cy;
    }
    ((max_x - min_x) / 2.0).max((max_y - min_y) / 2.0)
}
