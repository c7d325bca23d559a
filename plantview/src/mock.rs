//! In-process plant data for demo mode and tests.
//!
//! Provides a small deterministic plant (two central offices, a splice
//! group and two routes) and a [`MockBackend`] serving it without a
//! running backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use plantview_common::{
    EdgeKind, Error, NodeId, NodeKind, PositionUpdate, Result, RouteInventory, RouteSummary,
    TopologyBackend, TopologyEdge, TopologyNode, TopologySnapshot,
};

/// Whole-network overview: physical elements, one splice group, routes.
pub fn overview() -> TopologySnapshot {
    let nodes = vec![
        TopologyNode::new("101", NodeKind::PhysicalElement)
            .with_label("Central Norte")
            .at(-300.0, 0.0)
            .with_meta("reference", "CN-01"),
        TopologyNode::new("102", NodeKind::PhysicalElement)
            .with_label("Central Sur")
            .at(300.0, 0.0)
            .with_meta("reference", "CS-01"),
        TopologyNode::new("103", NodeKind::PhysicalElement)
            .with_label("Nodo Miraflores")
            .at(0.0, 220.0)
            .with_meta("reference", "MF-02"),
        TopologyNode::new("mufa:77", NodeKind::SpliceGroup).at(-20.0, -120.0),
    ];

    let edges = vec![
        TopologyEdge::new("route:R1", "101", "102", EdgeKind::NodeLink)
            .with_title("R1 Norte - Sur")
            .with_meta("route_id", "R1"),
        TopologyEdge::new("route:R2", "101", "103", EdgeKind::NodeLink)
            .with_title("R2 Norte - Miraflores")
            .with_meta("route_id", "R2"),
        TopologyEdge::new("101->mufa:77", "101", "mufa:77", EdgeKind::NodeToSplice)
            .with_title("1 ruta"),
        TopologyEdge::new("mufa:77->102", "mufa:77", "102", EdgeKind::SpliceToNode)
            .with_title("1 ruta"),
    ];

    TopologySnapshot::new(nodes, edges)
}

/// Logical route summaries.
pub fn routes() -> Vec<RouteSummary> {
    vec![
        RouteSummary {
            id: Some("R1".to_string()),
            from_odf_id: Some("ODF-CN-1".to_string()),
            to_odf_id: Some("ODF-CS-1".to_string()),
            path_text: Some("ODF-CN-1 > P-11 > P-12 > P-13 > ODF-CS-1".to_string()),
            span_list: None,
        },
        RouteSummary {
            id: Some("R2".to_string()),
            from_odf_id: Some("ODF-CN-2".to_string()),
            to_odf_id: Some("ODF-MF-1".to_string()),
            path_text: None,
            span_list: Some("S-21, S-22".to_string()),
        },
    ]
}

/// Graph of one route, including the access segments at both ends.
pub fn route_graph(route_id: &str) -> Option<TopologySnapshot> {
    match route_id {
        "R1" => Some(TopologySnapshot::new(
            vec![
                TopologyNode::new("rtr:CN", NodeKind::Router).with_label("PE-CN").at(-360.0, -80.0),
                TopologyNode::new("odf:CN-1", NodeKind::Odf).with_label("ODF-CN-1").at(-260.0, 0.0),
                TopologyNode::new("pole:11", NodeKind::Pole).with_label("P-11").at(-120.0, 0.0),
                TopologyNode::new("pole:12", NodeKind::Pole).with_label("P-12").at(0.0, 0.0),
                TopologyNode::new("pole:13", NodeKind::Pole).with_label("P-13").at(120.0, 0.0),
                TopologyNode::new("mufa:12", NodeKind::Mufa).with_label("M-12").at(0.0, 90.0),
                TopologyNode::new("odf:CS-1", NodeKind::Odf).with_label("ODF-CS-1").at(260.0, 0.0),
                TopologyNode::new("rtr:CS", NodeKind::Router).with_label("PE-CS").at(360.0, -80.0),
            ],
            vec![
                TopologyEdge::new("odf:rtr:CN", "rtr:CN", "odf:CN-1", EdgeKind::OdfLink),
                TopologyEdge::new("span:S-11", "odf:CN-1", "pole:11", EdgeKind::Span)
                    .with_title("S-11")
                    .with_meta("length_m", 420.5),
                TopologyEdge::new("span:S-12", "pole:11", "pole:12", EdgeKind::Span)
                    .with_title("S-12")
                    .with_meta("length_m", 380.0),
                TopologyEdge::new("span:S-13", "pole:12", "pole:13", EdgeKind::Span)
                    .with_title("S-13")
                    .with_meta("length_m", 395.2),
                TopologyEdge::new("span:S-14", "pole:13", "odf:CS-1", EdgeKind::Span)
                    .with_title("S-14")
                    .with_meta("length_m", 410.0),
                TopologyEdge::new("pm:12", "pole:12", "mufa:12", EdgeKind::PoleToMufa),
                TopologyEdge::new("odf:rtr:CS", "odf:CS-1", "rtr:CS", EdgeKind::OdfLink),
                TopologyEdge::new("patch:CN", "rtr:CN", "odf:CN-1", EdgeKind::Patch),
            ],
        )),
        "R2" => Some(TopologySnapshot::new(
            vec![
                TopologyNode::new("odf:CN-2", NodeKind::Odf).with_label("ODF-CN-2").at(-200.0, 0.0),
                TopologyNode::new("pole:21", NodeKind::Pole).with_label("P-21"),
                TopologyNode::new("odf:MF-1", NodeKind::Odf).with_label("ODF-MF-1").at(200.0, 0.0),
            ],
            vec![
                TopologyEdge::new("span:S-21", "odf:CN-2", "pole:21", EdgeKind::Span)
                    .with_title("S-21")
                    .with_meta("length_m", 510.0),
                TopologyEdge::new("span:S-22", "pole:21", "odf:MF-1", EdgeKind::Span)
                    .with_title("S-22")
                    .with_meta("length_m", 488.4),
            ],
        )),
        _ => None,
    }
}

/// Inventory totals derived from a route's graph.
pub fn inventory(route_id: &str) -> Option<RouteInventory> {
    let graph = route_graph(route_id)?;
    let count_nodes = |kind: NodeKind| graph.nodes.iter().filter(|n| n.kind == kind).count() as u32;
    let spans: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::Span)
        .collect();
    let total_length_m = spans
        .iter()
        .filter_map(|e| e.meta.get("length_m").and_then(serde_json::Value::as_f64))
        .sum();

    Some(RouteInventory {
        span_count: Some(spans.len() as u32),
        total_length_m: Some(total_length_m),
        pole_count: Some(count_nodes(NodeKind::Pole)),
        mufa_count: Some(count_nodes(NodeKind::Mufa)),
        cables: vec![format!("CBL-{}-48", route_id)],
    })
}

/// A [`TopologyBackend`] serving the mock plant.
///
/// Saved positions are kept in memory and applied to later snapshots.
#[derive(Debug, Default)]
pub struct MockBackend {
    positions: Mutex<HashMap<NodeId, (f32, f32)>>,
    fail_saves: AtomicBool,
    save_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of save requests received, failed ones included.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Position stored for a node, if any.
    pub fn stored_position(&self, id: &str) -> Option<(f32, f32)> {
        self.positions.lock().ok()?.get(id).copied()
    }

    fn with_stored_positions(&self, mut snapshot: TopologySnapshot) -> TopologySnapshot {
        if let Ok(positions) = self.positions.lock() {
            for node in snapshot.nodes.iter_mut() {
                if let Some((x, y)) = positions.get(&node.id) {
                    node.x = Some(*x);
                    node.y = Some(*y);
                    node.locked = true;
                }
            }
        }
        snapshot
    }
}

#[async_trait]
impl TopologyBackend for MockBackend {
    async fn overview(&self) -> Result<TopologySnapshot> {
        Ok(self.with_stored_positions(overview()))
    }

    async fn routes(&self) -> Result<Vec<RouteSummary>> {
        Ok(routes())
    }

    async fn route_graph(&self, route_id: &str) -> Result<TopologySnapshot> {
        let graph = route_graph(route_id).ok_or_else(|| Error::Status {
            status: 404,
            body: format!("Route {} not found", route_id),
        })?;
        Ok(self.with_stored_positions(graph))
    }

    async fn route_inventory(&self, route_id: &str) -> Result<Option<RouteInventory>> {
        Ok(inventory(route_id))
    }

    async fn save_positions(&self, updates: &[PositionUpdate]) -> Result<usize> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Status {
                status: 500,
                body: "BD_ERROR".to_string(),
            });
        }

        let mut positions = self
            .positions
            .lock()
            .map_err(|_| Error::Config("Mock position store poisoned".to_string()))?;
        for update in updates {
            positions.insert(update.node_id.clone(), (update.x, update.y));
        }
        Ok(updates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_edges_resolve() {
        for id in ["R1", "R2"] {
            let graph = route_graph(id).unwrap();
            for edge in &graph.edges {
                assert!(graph.nodes.iter().any(|n| n.id == edge.from), "{}", edge.id);
                assert!(graph.nodes.iter().any(|n| n.id == edge.to), "{}", edge.id);
            }
        }
        assert!(route_graph("R9").is_none());
    }

    #[test]
    fn test_inventory_totals() {
        let inventory = inventory("R1").unwrap();
        assert_eq!(inventory.span_count, Some(4));
        assert_eq!(inventory.pole_count, Some(3));
        assert_eq!(inventory.mufa_count, Some(1));
        assert!((inventory.total_length_m.unwrap() - 1605.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_saved_positions_are_served() {
        let backend = MockBackend::new();
        let saved = backend
            .save_positions(&[PositionUpdate::new("pole:21", 5.0, 6.0)])
            .await
            .unwrap();
        assert_eq!(saved, 1);

        let graph = backend.route_graph("R2").await.unwrap();
        let pole = graph.nodes.iter().find(|n| n.id == "pole:21").unwrap();
        assert_eq!((pole.x, pole.y), (Some(5.0), Some(6.0)));
    }

    #[tokio::test]
    async fn test_failing_saves() {
        let backend = MockBackend::new();
        backend.set_fail_saves(true);

        let result = backend
            .save_positions(&[PositionUpdate::new("101", 0.0, 0.0)])
            .await;
        assert!(matches!(result, Err(Error::Status { status: 500, .. })));
        assert_eq!(backend.save_calls(), 1);
        assert!(backend.stored_position("101").is_none());
    }
}
