//! PlantView - interactive viewer for telecom outside-plant topology.
//!
//! This library exposes the core components for testing.

pub mod app;
pub mod backend;
pub mod graph;
pub mod message;
pub mod mock;
pub mod subscription;
pub mod view;

// Re-export commonly used types
pub use app::PlantView;
pub use message::{GraphMessage, Message, Screen};
