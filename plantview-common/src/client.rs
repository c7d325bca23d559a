//! Backend access for topology snapshots and position persistence.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::serialization::{decode_inventory, decode_routes, decode_snapshot};
use crate::topology::{PositionUpdate, RouteInventory, RouteSummary, TopologySnapshot};

/// Source of topology data and sink for node positions.
#[async_trait]
pub trait TopologyBackend: Send + Sync {
    /// Whole-network overview graph.
    async fn overview(&self) -> Result<TopologySnapshot>;

    /// Logical route summaries.
    async fn routes(&self) -> Result<Vec<RouteSummary>>;

    /// Graph scoped to one route, including its access segments.
    async fn route_graph(&self, route_id: &str) -> Result<TopologySnapshot>;

    /// Inventory totals for one route.
    async fn route_inventory(&self, route_id: &str) -> Result<Option<RouteInventory>>;

    /// Persist a batch of node positions. Returns the number of stored rows.
    async fn save_positions(&self, updates: &[PositionUpdate]) -> Result<usize>;
}

/// HTTP implementation of [`TopologyBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for the configured backend.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::Config(format!("Invalid API base URL '{}': {}", config.base_url, e))
        })?;

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("plantview/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Build an endpoint URL from path segments (each segment is escaped).
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!(
                    "API base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Value> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");

        let response = self.http.get(url).send().await?;
        read_json(response).await
    }
}

/// Read a JSON body, turning non-2xx replies into [`Error::Status`].
async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Status {
            status: status.as_u16(),
            body: error_detail(&body),
        });
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Prefer the backend's `detail` message over the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl TopologyBackend for HttpBackend {
    async fn overview(&self) -> Result<TopologySnapshot> {
        let value = self.get_json(&["graph", "overview"]).await?;
        Ok(decode_snapshot(&value))
    }

    async fn routes(&self) -> Result<Vec<RouteSummary>> {
        let value = self.get_json(&["topology", "routes"]).await?;
        Ok(decode_routes(&value))
    }

    async fn route_graph(&self, route_id: &str) -> Result<TopologySnapshot> {
        let value = self
            .get_json(&["topology", "routes", route_id, "graph-with-access"])
            .await?;
        Ok(decode_snapshot(&value))
    }

    async fn route_inventory(&self, route_id: &str) -> Result<Option<RouteInventory>> {
        let value = self
            .get_json(&["topology", "routes", route_id, "inventory"])
            .await?;
        Ok(decode_inventory(&value))
    }

    async fn save_positions(&self, updates: &[PositionUpdate]) -> Result<usize> {
        let url = self.endpoint(&["graph", "positions", ""])?;
        tracing::debug!(%url, count = updates.len(), "POST positions");

        let response = self.http.post(url).json(updates).send().await?;
        let value = read_json(response).await?;

        let count = value
            .get("count")
            .and_then(Value::as_u64)
            .map(|c| c as usize)
            .unwrap_or(updates.len());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&ApiConfig {
            base_url: base.to_string(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let backend = backend("http://localhost:8000");
        let url = backend
            .endpoint(&["topology", "routes", "R 1", "inventory"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/topology/routes/R%201/inventory"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = backend("http://gateway/api/");
        let url = backend.endpoint(&["graph", "positions", ""]).unwrap();
        assert_eq!(url.as_str(), "http://gateway/api/graph/positions/");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpBackend::new(&ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail":"BD_ERROR"}"#), "BD_ERROR");
        assert_eq!(error_detail("plain failure"), "plain failure");
    }
}
