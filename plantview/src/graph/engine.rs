//! The seam between the viewer core and whatever draws the graph.

use plantview_common::{EdgeId, NodeId, PositionUpdate};

use super::adapter::RenderGraph;
use super::style::{EdgeStyle, NodeStyle};

/// What a pointer event landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Node(NodeId),
    Edge(EdgeId),
    /// Empty canvas.
    Canvas,
}

impl Hit {
    /// Resolve a hit test that may report both a node and an edge.
    ///
    /// Nodes take priority.
    pub fn resolve(node: Option<NodeId>, edge: Option<EdgeId>) -> Self {
        match (node, edge) {
            (Some(node), _) => Hit::Node(node),
            (None, Some(edge)) => Hit::Edge(edge),
            (None, None) => Hit::Canvas,
        }
    }
}

/// Pointer events reported by the rendering engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Click(Hit),
    DoubleClick(Hit),
    /// A drag gesture began on these nodes.
    DragStart(Vec<NodeId>),
    /// A drag gesture on these nodes was released.
    DragEnd(Vec<NodeId>),
}

/// Partial update of one render node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodePatch {
    pub locked: Option<bool>,
    pub unsaved: Option<bool>,
    pub style: Option<NodeStyle>,
}

impl NodePatch {
    pub fn locked(locked: bool) -> Self {
        Self {
            locked: Some(locked),
            ..Self::default()
        }
    }

    pub fn style(style: NodeStyle) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }
}

/// Partial update of one render edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgePatch {
    pub style: Option<EdgeStyle>,
}

/// Imperative operations the viewer needs from a rendering engine.
///
/// The engine owns node positions once data is set: positions supplied in
/// the render graph are the starting point, drags move free nodes, and
/// locked nodes stay where they are.
pub trait RenderEngine {
    /// Replace the displayed graph.
    fn set_data(&mut self, graph: RenderGraph);

    /// The graph currently displayed, including per-node patches.
    fn graph(&self) -> &RenderGraph;

    /// Current coordinates of the given nodes, skipping unknown ids.
    fn positions(&self, ids: &[NodeId]) -> Vec<PositionUpdate>;

    /// Current coordinates of every displayed node, in graph order.
    fn all_positions(&self) -> Vec<PositionUpdate>;

    /// Zoom and pan so the whole graph is visible.
    fn fit(&mut self);

    /// Patch one node. Returns `false` if the node is not displayed.
    fn update_node(&mut self, id: &str, patch: NodePatch) -> bool;

    /// Patch one edge. Returns `false` if the edge is not displayed.
    fn update_edge(&mut self, id: &str, patch: EdgePatch) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_win_hit_resolution() {
        assert_eq!(
            Hit::resolve(Some("N".into()), Some("E".into())),
            Hit::Node("N".into())
        );
        assert_eq!(Hit::resolve(None, Some("E".into())), Hit::Edge("E".into()));
        assert_eq!(Hit::resolve(None, None), Hit::Canvas);
    }
}
