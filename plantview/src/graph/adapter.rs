//! Mapping from raw topology snapshots to style-annotated render graphs.
//!
//! [`GraphAdapter::adapt`] is a pure function of its inputs: the same
//! snapshot, style sheet and layer filter always produce an equal
//! [`RenderGraph`], in input order. A graph is never patched in place by
//! the adapter; a new snapshot means a new graph.

use std::collections::{BTreeSet, HashSet};

use plantview_common::{
    EdgeId, EdgeKind, Meta, NodeId, NodeKind, TopologyEdge, TopologyNode, TopologySnapshot,
};

use super::style::{EdgeStyle, NodeStyle, StyleSheet};

/// A node ready to be handed to the rendering engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// Fixed position (not draggable by the engine).
    pub locked: bool,
    /// Position changed locally but not persisted.
    pub unsaved: bool,
    pub style: NodeStyle,
    pub meta: Meta,
    pub layer: Option<String>,
    pub status: Option<String>,
}

/// An edge ready to be handed to the rendering engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub title: String,
    pub style: EdgeStyle,
    pub meta: Meta,
}

/// The style-annotated graph handed to the rendering engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut RenderNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut RenderEdge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Kinds hidden from the render graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerFilter {
    hidden_nodes: BTreeSet<NodeKind>,
    hidden_edges: BTreeSet<EdgeKind>,
}

impl LayerFilter {
    /// Show or hide a node kind. Returns whether it is now visible.
    pub fn toggle_node(&mut self, kind: NodeKind) -> bool {
        if !self.hidden_nodes.remove(&kind) {
            self.hidden_nodes.insert(kind);
            false
        } else {
            true
        }
    }

    /// Show or hide an edge kind. Returns whether it is now visible.
    pub fn toggle_edge(&mut self, kind: EdgeKind) -> bool {
        if !self.hidden_edges.remove(&kind) {
            self.hidden_edges.insert(kind);
            false
        } else {
            true
        }
    }

    pub fn is_node_visible(&self, kind: &NodeKind) -> bool {
        !self.hidden_nodes.contains(kind)
    }

    pub fn is_edge_visible(&self, kind: &EdgeKind) -> bool {
        !self.hidden_edges.contains(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.hidden_nodes.is_empty() && self.hidden_edges.is_empty()
    }
}

/// Turns topology snapshots into render graphs.
#[derive(Debug, Clone, Default)]
pub struct GraphAdapter {
    styles: StyleSheet,
    filter: LayerFilter,
}

impl GraphAdapter {
    pub fn new(styles: StyleSheet) -> Self {
        Self {
            styles,
            filter: LayerFilter::default(),
        }
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    pub fn filter(&self) -> &LayerFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut LayerFilter {
        &mut self.filter
    }

    /// Build the render graph for a snapshot.
    pub fn adapt(&self, snapshot: &TopologySnapshot) -> RenderGraph {
        adapt(snapshot, &self.styles, &self.filter)
    }
}

/// Build the render graph for a snapshot.
///
/// Duplicate node ids keep their first occurrence. Edges whose endpoints
/// are missing (or hidden by the filter) are dropped, so every edge of
/// the result resolves to nodes of the result.
pub fn adapt(
    snapshot: &TopologySnapshot,
    styles: &StyleSheet,
    filter: &LayerFilter,
) -> RenderGraph {
    let mut seen: HashSet<&str> = HashSet::with_capacity(snapshot.nodes.len());
    let mut nodes = Vec::with_capacity(snapshot.nodes.len());

    for node in &snapshot.nodes {
        if !seen.insert(node.id.as_str()) {
            tracing::warn!(node = %node.id, "Duplicate node id in snapshot, keeping the first");
            continue;
        }
        if filter.is_node_visible(&node.kind) {
            nodes.push(render_node(node, styles));
        }
    }

    let visible: HashSet<&str> = nodes.iter().map(|n: &RenderNode| n.id.as_str()).collect();
    let mut edge_ids: HashSet<&str> = HashSet::with_capacity(snapshot.edges.len());
    let mut edges = Vec::with_capacity(snapshot.edges.len());

    for edge in &snapshot.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            tracing::warn!(edge = %edge.id, "Duplicate edge id in snapshot, keeping the first");
            continue;
        }
        if !filter.is_edge_visible(&edge.kind) {
            continue;
        }
        if !visible.contains(edge.from.as_str()) || !visible.contains(edge.to.as_str()) {
            if seen.contains(edge.from.as_str()) && seen.contains(edge.to.as_str()) {
                // Endpoint hidden by a layer, not a data problem.
                continue;
            }
            tracing::warn!(
                edge = %edge.id,
                from = %edge.from,
                to = %edge.to,
                "Dropping edge with unknown endpoint"
            );
            continue;
        }
        edges.push(render_edge(edge, styles));
    }

    RenderGraph { nodes, edges }
}

fn render_node(node: &TopologyNode, styles: &StyleSheet) -> RenderNode {
    // Splice groups stay unlabeled unless the backend names them.
    let label = match (&node.label, node.kind.is_splice()) {
        (Some(label), _) => label.clone(),
        (None, true) => String::new(),
        (None, false) => node.id.clone(),
    };

    RenderNode {
        id: node.id.clone(),
        kind: node.kind.clone(),
        label,
        x: node.x,
        y: node.y,
        locked: node.locked,
        unsaved: false,
        style: styles.node_style(&node.kind),
        meta: node.meta.clone(),
        layer: node.layer.clone(),
        status: node.status.clone(),
    }
}

fn render_edge(edge: &TopologyEdge, styles: &StyleSheet) -> RenderEdge {
    RenderEdge {
        id: edge.id.clone(),
        from: edge.from.clone(),
        to: edge.to.clone(),
        kind: edge.kind.clone(),
        title: edge.title.clone().unwrap_or_default(),
        style: styles.edge_style(&edge.kind),
        meta: edge.meta.clone(),
    }
}
