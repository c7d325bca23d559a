//! Double-click on a route edge opens that route.

use serde_json::Value;

use plantview_common::Meta;

use super::adapter::RenderGraph;
use super::callback::CallbackSlot;
use super::engine::Hit;

/// Route id carried in an edge's meta, if present and non-empty.
///
/// Numeric ids are accepted and rendered as strings.
pub fn route_id(meta: &Meta) -> Option<String> {
    match meta.get("route_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Opens a route when a double-click lands on an edge that names one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteNavigationTrigger;

impl RouteNavigationTrigger {
    /// Handle one double-click. Returns the route id that was opened.
    pub fn fire(
        &self,
        hit: &Hit,
        graph: &RenderGraph,
        open_route: &CallbackSlot<String>,
    ) -> Option<String> {
        let Hit::Edge(edge_id) = hit else {
            return None;
        };
        let edge = graph.edge(edge_id)?;
        let route = route_id(&edge.meta)?;

        tracing::info!(edge = %edge_id, route = %route, "Opening route from edge");
        if !open_route.invoke(route.clone()) {
            tracing::debug!(route = %route, "No route navigation callback set");
        }
        Some(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::adapter::GraphAdapter;
    use plantview_common::{EdgeKind, NodeKind, TopologyEdge, TopologyNode, TopologySnapshot};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn graph() -> RenderGraph {
        GraphAdapter::default().adapt(&TopologySnapshot::new(
            vec![
                TopologyNode::new("A", NodeKind::PhysicalElement),
                TopologyNode::new("B", NodeKind::PhysicalElement),
            ],
            vec![
                TopologyEdge::new("route:R1", "A", "B", EdgeKind::NodeLink).with_meta("route_id", "R1"),
                TopologyEdge::new("plain", "A", "B", EdgeKind::NodeLink),
                TopologyEdge::new("blank", "A", "B", EdgeKind::NodeLink).with_meta("route_id", " "),
                TopologyEdge::new("numeric", "A", "B", EdgeKind::NodeLink).with_meta("route_id", 42),
            ],
        ))
    }

    fn recorder() -> (CallbackSlot<String>, Rc<RefCell<Vec<String>>>) {
        let slot = CallbackSlot::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&calls);
        slot.set(move |id| log.borrow_mut().push(id));
        (slot, calls)
    }

    #[test]
    fn test_route_edge_opens_once() {
        let (slot, calls) = recorder();
        let opened = RouteNavigationTrigger.fire(&Hit::Edge("route:R1".into()), &graph(), &slot);

        assert_eq!(opened.as_deref(), Some("R1"));
        assert_eq!(*calls.borrow(), vec!["R1".to_string()]);
    }

    #[test]
    fn test_nodes_and_plain_edges_do_nothing() {
        let (slot, calls) = recorder();
        let graph = graph();
        let trigger = RouteNavigationTrigger;

        assert!(trigger.fire(&Hit::Node("A".into()), &graph, &slot).is_none());
        assert!(trigger.fire(&Hit::Edge("plain".into()), &graph, &slot).is_none());
        assert!(trigger.fire(&Hit::Edge("blank".into()), &graph, &slot).is_none());
        assert!(trigger.fire(&Hit::Canvas, &graph, &slot).is_none());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_numeric_route_id() {
        let (slot, calls) = recorder();
        RouteNavigationTrigger.fire(&Hit::Edge("numeric".into()), &graph(), &slot);
        assert_eq!(*calls.borrow(), vec!["42".to_string()]);
    }
}
