//! Lenient decoding of backend payloads.
//!
//! The backend is allowed to omit or garble collections; decoding never
//! fails on shape. Missing or non-array `nodes`/`edges` become empty
//! collections and individual records that do not decode are skipped
//! with a warning.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::topology::{RouteInventory, RouteSummary, TopologySnapshot};

/// Decode a topology snapshot from a JSON value.
pub fn decode_snapshot(value: &Value) -> TopologySnapshot {
    TopologySnapshot {
        nodes: decode_records(value.get("nodes"), "node"),
        edges: decode_records(value.get("edges"), "edge"),
    }
}

/// Decode a topology snapshot from raw bytes.
///
/// Only a body that is not JSON at all is an error.
pub fn parse_snapshot(data: &[u8]) -> Result<TopologySnapshot> {
    let value: Value = serde_json::from_slice(data)?;
    Ok(decode_snapshot(&value))
}

/// Decode the route list; anything but an array yields an empty list.
pub fn decode_routes(value: &Value) -> Vec<RouteSummary> {
    decode_records(Some(value), "route")
}

/// Decode a route inventory; `null` or a non-object yields `None`.
pub fn decode_inventory(value: &Value) -> Option<RouteInventory> {
    if !value.is_object() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(inventory) => Some(inventory),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed route inventory");
            None
        }
    }
}

fn decode_records<T: DeserializeOwned>(value: Option<&Value>, what: &'static str) -> Vec<T> {
    let Some(items) = value.and_then(Value::as_array) else {
        if value.is_some_and(|v| !v.is_null()) {
            tracing::warn!(record = what, "Expected an array, treating as empty");
        }
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(record = what, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}
