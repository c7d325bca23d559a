//! Interactive graph viewer core.
//!
//! Everything here is independent of how the graph is drawn; the iced
//! canvas in [`crate::view::canvas`] is one [`RenderEngine`].

pub mod adapter;
pub mod callback;
pub mod engine;
pub mod navigation;
pub mod pane;
pub mod persistence;
pub mod selection;
pub mod style;

pub use adapter::{GraphAdapter, LayerFilter, RenderEdge, RenderGraph, RenderNode, adapt};
pub use callback::CallbackSlot;
pub use engine::{EdgePatch, EngineEvent, Hit, NodePatch, RenderEngine};
pub use navigation::{RouteNavigationTrigger, route_id};
pub use pane::GraphPane;
pub use persistence::{BatchOrigin, PositionBatch, PositionPersistence, SaveOutcome};
pub use selection::{
    Emit, Pin, PinKind, Selected, SelectedEdge, SelectedNode, SelectionBehavior,
    SelectionController, SelectionPayload, SelectionState,
};
pub use style::{EdgeStyle, NodeShape, NodeStyle, StyleSheet};
