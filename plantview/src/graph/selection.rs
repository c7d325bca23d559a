//! Click-to-select state machine with an optional sticky pin.

use serde::Serialize;

use plantview_common::{EdgeId, EdgeKind, Meta, NodeId, NodeKind};

use super::adapter::{RenderEdge, RenderGraph, RenderNode};
use super::engine::Hit;

/// Which kind of element a pin refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Node,
    Edge,
}

/// A sticky highlighted selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pin {
    #[serde(rename = "type")]
    pub kind: PinKind,
    pub id: String,
}

impl Pin {
    pub fn node(id: impl Into<String>) -> Self {
        Self {
            kind: PinKind::Node,
            id: id.into(),
        }
    }

    pub fn edge(id: impl Into<String>) -> Self {
        Self {
            kind: PinKind::Edge,
            id: id.into(),
        }
    }
}

/// Projection of a clicked node for the details panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub layer: Option<String>,
    pub status: Option<String>,
    pub meta: Meta,
}

impl From<&RenderNode> for SelectedNode {
    fn from(node: &RenderNode) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind.clone(),
            label: node.label.clone(),
            layer: node.layer.clone(),
            status: node.status.clone(),
            meta: node.meta.clone(),
        }
    }
}

/// Projection of a clicked edge for the details panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedEdge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub from: NodeId,
    pub to: NodeId,
    pub title: String,
    pub meta: Meta,
}

impl From<&RenderEdge> for SelectedEdge {
    fn from(edge: &RenderEdge) -> Self {
        Self {
            id: edge.id.clone(),
            kind: edge.kind.clone(),
            from: edge.from.clone(),
            to: edge.to.clone(),
            title: edge.title.clone(),
            meta: edge.meta.clone(),
        }
    }
}

/// Exactly one selected element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selected {
    Node(SelectedNode),
    Edge(SelectedEdge),
}

impl Selected {
    pub fn id(&self) -> &str {
        match self {
            Selected::Node(node) => &node.id,
            Selected::Edge(edge) => &edge.id,
        }
    }
}

/// What the details panel receives. `None` at the use site means nothing
/// is selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionPayload {
    #[serde(flatten)]
    pub selected: Selected,
    pub pinned: Option<Pin>,
}

/// Derived state of a [`SelectionController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Selected,
    PinnedSelected,
    /// The next element click pins.
    SelectArm,
}

/// Which optional behaviors a view enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBehavior {
    /// Select mode can be armed to pin elements.
    pub pinning: bool,
    /// A click on empty canvas clears the details panel.
    pub clear_on_empty_click: bool,
}

impl SelectionBehavior {
    pub fn overview() -> Self {
        Self {
            pinning: false,
            clear_on_empty_click: true,
        }
    }

    pub fn route_detail() -> Self {
        Self {
            pinning: true,
            clear_on_empty_click: false,
        }
    }
}

/// What the details panel should be told.
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    Select(SelectionPayload),
    Clear,
}

impl Emit {
    pub fn into_payload(self) -> Option<SelectionPayload> {
        match self {
            Emit::Select(payload) => Some(payload),
            Emit::Clear => None,
        }
    }
}

/// Canvas highlight changes caused by a selection step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightChange {
    /// Restore the kind-based style of this element.
    pub clear: Option<Pin>,
    /// Apply the highlight style to this element.
    pub apply: Option<Pin>,
}

/// Result of one selection step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOutcome {
    pub emit: Option<Emit>,
    pub highlight: HighlightChange,
}

/// Turns clicks into selection payloads.
#[derive(Debug, Clone)]
pub struct SelectionController {
    behavior: SelectionBehavior,
    armed: bool,
    pin: Option<Pin>,
    current: Option<SelectionPayload>,
}

impl SelectionController {
    pub fn new(behavior: SelectionBehavior) -> Self {
        Self {
            behavior,
            armed: false,
            pin: None,
            current: None,
        }
    }

    pub fn behavior(&self) -> SelectionBehavior {
        self.behavior
    }

    pub fn state(&self) -> SelectionState {
        if self.armed {
            SelectionState::SelectArm
        } else if self.pin.is_some() {
            SelectionState::PinnedSelected
        } else if self.current.is_some() {
            SelectionState::Selected
        } else {
            SelectionState::Idle
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn pin(&self) -> Option<&Pin> {
        self.pin.as_ref()
    }

    /// The last emitted payload.
    pub fn current(&self) -> Option<&SelectionPayload> {
        self.current.as_ref()
    }

    /// Flip the arm flag. Pin and payload are untouched.
    ///
    /// Returns the new arm state; always `false` when pinning is disabled.
    pub fn toggle_select_mode(&mut self) -> bool {
        if self.behavior.pinning {
            self.armed = !self.armed;
        }
        self.armed
    }

    /// Process one click against the displayed graph.
    pub fn click(&mut self, hit: &Hit, graph: &RenderGraph) -> SelectionOutcome {
        // Any click consumes the arm, whatever it hits.
        let armed = std::mem::take(&mut self.armed);

        let (selected, pin) = match hit {
            Hit::Node(id) => match graph.node(id) {
                Some(node) => (Selected::Node(node.into()), Pin::node(id.clone())),
                None => {
                    tracing::debug!(node = %id, "Click on a node that is not displayed");
                    return SelectionOutcome::default();
                }
            },
            Hit::Edge(id) => match graph.edge(id) {
                Some(edge) => (Selected::Edge(edge.into()), Pin::edge(id.clone())),
                None => {
                    tracing::debug!(edge = %id, "Click on an edge that is not displayed");
                    return SelectionOutcome::default();
                }
            },
            Hit::Canvas => return self.empty_click(),
        };

        let mut highlight = HighlightChange::default();
        if armed {
            if self.pin.as_ref() != Some(&pin) {
                highlight.clear = self.pin.take();
                highlight.apply = Some(pin.clone());
            }
            self.pin = Some(pin);
        }

        let payload = SelectionPayload {
            selected,
            pinned: self.pin.clone(),
        };
        self.current = Some(payload.clone());

        SelectionOutcome {
            emit: Some(Emit::Select(payload)),
            highlight,
        }
    }

    fn empty_click(&mut self) -> SelectionOutcome {
        if !self.behavior.clear_on_empty_click {
            return SelectionOutcome::default();
        }
        self.current = None;
        SelectionOutcome {
            emit: Some(Emit::Clear),
            highlight: HighlightChange::default(),
        }
    }

    /// Drop the pin and the current payload. The arm flag is kept.
    pub fn clear(&mut self) -> SelectionOutcome {
        self.current = None;
        SelectionOutcome {
            emit: Some(Emit::Clear),
            highlight: HighlightChange {
                clear: self.pin.take(),
                apply: None,
            },
        }
    }

    /// Back to `Idle`: no payload, no pin, not armed.
    pub fn reset(&mut self) -> SelectionOutcome {
        self.armed = false;
        self.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::adapter::GraphAdapter;
    use plantview_common::{TopologyEdge, TopologyNode, TopologySnapshot};

    fn graph() -> RenderGraph {
        GraphAdapter::default().adapt(&TopologySnapshot::new(
            vec![
                TopologyNode::new("A", NodeKind::PhysicalElement).with_label("Central"),
                TopologyNode::new("B", NodeKind::SpliceGroup),
            ],
            vec![TopologyEdge::new("E", "A", "B", EdgeKind::NodeToSplice).with_title("2 rutas")],
        ))
    }

    fn selected_id(outcome: &SelectionOutcome) -> Option<&str> {
        match &outcome.emit {
            Some(Emit::Select(payload)) => Some(payload.selected.id()),
            _ => None,
        }
    }

    #[test]
    fn test_plain_clicks_emit_in_order() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::overview());

        let first = selection.click(&Hit::Node("A".into()), &graph);
        let second = selection.click(&Hit::Node("B".into()), &graph);

        assert_eq!(selected_id(&first), Some("A"));
        assert_eq!(selected_id(&second), Some("B"));
        assert_eq!(first.highlight, HighlightChange::default());
        assert_eq!(selection.state(), SelectionState::Selected);
    }

    #[test]
    fn test_edge_projection() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::overview());

        let outcome = selection.click(&Hit::Edge("E".into()), &graph);
        let Some(Emit::Select(payload)) = outcome.emit else {
            panic!("expected a payload");
        };
        let Selected::Edge(edge) = payload.selected else {
            panic!("expected an edge");
        };
        assert_eq!((edge.from.as_str(), edge.to.as_str()), ("A", "B"));
        assert_eq!(edge.title, "2 rutas");
        assert!(payload.pinned.is_none());
    }

    #[test]
    fn test_armed_click_pins_once() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::route_detail());

        assert!(selection.toggle_select_mode());
        assert_eq!(selection.state(), SelectionState::SelectArm);

        let pinned = selection.click(&Hit::Edge("E".into()), &graph);
        assert_eq!(pinned.highlight.apply, Some(Pin::edge("E")));
        assert!(!selection.is_armed());
        assert_eq!(selection.state(), SelectionState::PinnedSelected);

        // Unarmed click carries the pin unchanged.
        let next = selection.click(&Hit::Node("A".into()), &graph);
        let Some(Emit::Select(payload)) = next.emit else {
            panic!("expected a payload");
        };
        assert_eq!(payload.pinned, Some(Pin::edge("E")));
        assert_eq!(next.highlight, HighlightChange::default());
    }

    #[test]
    fn test_new_pin_replaces_old() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::route_detail());

        selection.toggle_select_mode();
        selection.click(&Hit::Node("A".into()), &graph);
        selection.toggle_select_mode();
        let outcome = selection.click(&Hit::Node("B".into()), &graph);

        assert_eq!(outcome.highlight.clear, Some(Pin::node("A")));
        assert_eq!(outcome.highlight.apply, Some(Pin::node("B")));
        assert_eq!(selection.pin(), Some(&Pin::node("B")));
    }

    #[test]
    fn test_arm_resets_on_empty_click() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::route_detail());

        selection.toggle_select_mode();
        let outcome = selection.click(&Hit::Canvas, &graph);
        assert!(outcome.emit.is_none());
        assert!(!selection.is_armed());
    }

    #[test]
    fn test_empty_click_clears_in_overview() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::overview());

        selection.click(&Hit::Node("A".into()), &graph);
        let outcome = selection.click(&Hit::Canvas, &graph);
        assert_eq!(outcome.emit, Some(Emit::Clear));
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_toggle_keeps_pin_and_payload() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::route_detail());

        selection.toggle_select_mode();
        selection.click(&Hit::Node("A".into()), &graph);
        selection.toggle_select_mode();
        selection.toggle_select_mode();

        assert_eq!(selection.pin(), Some(&Pin::node("A")));
        assert!(selection.current().is_some());
    }

    #[test]
    fn test_clear_keeps_arm() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::route_detail());

        selection.toggle_select_mode();
        selection.click(&Hit::Node("A".into()), &graph);
        selection.toggle_select_mode();

        let outcome = selection.clear();
        assert_eq!(outcome.emit, Some(Emit::Clear));
        assert_eq!(outcome.highlight.clear, Some(Pin::node("A")));
        assert!(selection.pin().is_none());
        assert!(selection.is_armed());

        selection.reset();
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_pinning_disabled_in_overview() {
        let mut selection = SelectionController::new(SelectionBehavior::overview());
        assert!(!selection.toggle_select_mode());
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_payload_wire_shape() {
        let graph = graph();
        let mut selection = SelectionController::new(SelectionBehavior::route_detail());
        selection.toggle_select_mode();
        let outcome = selection.click(&Hit::Node("A".into()), &graph);
        let payload = outcome.emit.and_then(Emit::into_payload).unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["node"]["id"], "A");
        assert_eq!(json["pinned"]["type"], "node");
    }
}
