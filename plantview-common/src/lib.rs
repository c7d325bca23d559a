//! PlantView Common Library
//!
//! Shared types and plumbing for the PlantView topology viewer:
//!
//! - [`topology`] - Plant topology model (`TopologyNode`, `TopologyEdge`, `PositionUpdate`, ...)
//! - [`serialization`] - Lenient decoding of backend payloads
//! - [`client`] - Backend access (`TopologyBackend`, `HttpBackend`)
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`error`] - Error types

pub mod client;
pub mod config;
pub mod error;
pub mod serialization;
pub mod topology;

// Re-export commonly used types at the crate root
pub use client::{HttpBackend, TopologyBackend};
pub use config::{
    ApiConfig, LogFormat, LoggingConfig, PlantViewConfig, ViewerConfig, load_config,
    load_config_or_default, parse_config,
};
pub use error::{Error, Result};
pub use serialization::{decode_inventory, decode_routes, decode_snapshot, parse_snapshot};
pub use topology::{
    EdgeId, EdgeKind, Meta, NodeId, NodeKind, PositionUpdate, RouteInventory, RouteSummary,
    TopologyEdge, TopologyNode, TopologySnapshot,
};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
