//! Async calls to the topology backend, shaped for iced tasks.
//!
//! Errors are flattened to strings so results can travel inside
//! `Clone` messages.

use std::sync::Arc;

use plantview_common::{
    PositionUpdate, RouteInventory, RouteSummary, TopologyBackend, TopologySnapshot,
};

/// Shared handle to whichever backend the application runs against.
pub type Backend = Arc<dyn TopologyBackend>;

/// Result of loading one route: graph and inventory, fetched together.
#[derive(Debug, Clone)]
pub struct RouteFetch {
    pub graph: Result<TopologySnapshot, String>,
    pub inventory: Result<Option<RouteInventory>, String>,
}

pub async fn fetch_overview(backend: Backend) -> Result<TopologySnapshot, String> {
    backend.overview().await.map_err(|e| e.to_string())
}

pub async fn fetch_routes(backend: Backend) -> Result<Vec<RouteSummary>, String> {
    backend.routes().await.map_err(|e| e.to_string())
}

/// Load a route's graph and inventory concurrently.
pub async fn fetch_route(backend: Backend, route_id: String) -> RouteFetch {
    let (graph, inventory) = tokio::join!(
        backend.route_graph(&route_id),
        backend.route_inventory(&route_id)
    );

    RouteFetch {
        graph: graph.map_err(|e| e.to_string()),
        inventory: inventory.map_err(|e| e.to_string()),
    }
}

pub async fn save_positions(
    backend: Backend,
    updates: Vec<PositionUpdate>,
) -> Result<usize, String> {
    backend
        .save_positions(&updates)
        .await
        .map_err(|e| e.to_string())
}
