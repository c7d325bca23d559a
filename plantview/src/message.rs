use iced::Size;

use plantview_common::{EdgeKind, NodeId, NodeKind, RouteSummary, TopologySnapshot};

use crate::backend::RouteFetch;
use crate::graph::{EngineEvent, SelectionPayload};

/// Which screen a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Overview,
    Route,
}

/// Messages handled by one graph screen.
#[derive(Debug, Clone)]
pub enum GraphMessage {
    /// Pointer event reported by the canvas.
    Engine(EngineEvent),

    /// Free nodes moved by a drag, in graph units.
    DragMove {
        nodes: Vec<NodeId>,
        dx: f32,
        dy: f32,
    },

    /// Canvas panned, in graph units.
    Pan(f32, f32),

    ZoomIn,
    ZoomOut,
    ZoomReset,

    /// The canvas changed size.
    Resized(Size),

    /// Zoom and pan to show the whole graph.
    Fit,

    /// Drop the pin and clear the details panel.
    ClearSelection,

    /// Arm or disarm select mode.
    ToggleSelectMode,

    /// Lock or unlock node dragging.
    ToggleDragLock,

    /// Save every node's current position.
    SaveAll,

    /// Show or hide a node kind.
    ToggleNodeLayer(NodeKind),

    /// Show or hide an edge kind.
    ToggleEdgeLayer(EdgeKind),

    /// Fetch the graph again.
    Reload,
}

/// Messages for the PlantView application.
#[derive(Debug, Clone)]
pub enum Message {
    /// Message for the overview screen.
    Overview(GraphMessage),

    /// Message for the route detail screen.
    Route(GraphMessage),

    /// Overview snapshot fetch finished.
    OverviewLoaded {
        generation: u64,
        result: Result<TopologySnapshot, String>,
    },

    /// Route graph and inventory fetch finished.
    RouteLoaded {
        generation: u64,
        route_id: String,
        fetch: RouteFetch,
    },

    /// Route list fetch finished.
    RoutesLoaded(Result<Vec<RouteSummary>, String>),

    /// A position batch was answered by the backend.
    PositionsSaved {
        screen: Screen,
        batch: u64,
        result: Result<usize, String>,
    },

    /// A screen's selection changed; `None` means nothing is selected.
    Selected {
        screen: Screen,
        payload: Option<SelectionPayload>,
    },

    /// Open the detail view of a route.
    OpenRoute(String),

    /// Back to the overview.
    Back,

    /// Fetch the route list again.
    ReloadRoutes,

    /// Remove a notification.
    DismissNotification(u64),

    /// Tick for periodic UI updates.
    Tick,
}
