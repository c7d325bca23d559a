use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a topology node.
pub type NodeId = String;

/// Unique identifier of a topology edge.
pub type EdgeId = String;

/// Opaque attribute mapping carried by nodes and edges.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Kind of a plant element.
///
/// The backend speaks two vocabularies (the overview `kind` and the
/// route-view `group`); both parse into the same enum. Unrecognized
/// values are kept verbatim in [`NodeKind::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// A physical site or cabinet ("NODO").
    #[default]
    PhysicalElement,
    /// A splice group drawn between physical elements ("MUFA_SPLIT").
    SpliceGroup,
    /// Optical distribution frame.
    Odf,
    /// Router.
    Router,
    /// Pole.
    Pole,
    /// Splice enclosure.
    Mufa,
    /// Anything else the backend sends.
    Other(String),
}

impl NodeKind {
    /// Parse a wire value, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NODO" | "NODE" | "PHYSICAL_ELEMENT" => NodeKind::PhysicalElement,
            "MUFA_SPLIT" | "SPLICE_GROUP" => NodeKind::SpliceGroup,
            "ODF" => NodeKind::Odf,
            "ROUTER" => NodeKind::Router,
            "POLE" => NodeKind::Pole,
            "MUFA" => NodeKind::Mufa,
            _ => NodeKind::Other(raw.to_string()),
        }
    }

    /// Canonical wire name.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::PhysicalElement => "PHYSICAL_ELEMENT",
            NodeKind::SpliceGroup => "SPLICE_GROUP",
            NodeKind::Odf => "ODF",
            NodeKind::Router => "ROUTER",
            NodeKind::Pole => "POLE",
            NodeKind::Mufa => "MUFA",
            NodeKind::Other(raw) => raw,
        }
    }

    /// Whether this kind is a splice/group element rather than a physical one.
    pub fn is_splice(&self) -> bool {
        matches!(self, NodeKind::SpliceGroup)
    }
}

impl From<String> for NodeKind {
    fn from(raw: String) -> Self {
        NodeKind::parse(&raw)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a link between plant elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeKind {
    /// Direct link between two physical elements (a backbone route).
    #[default]
    NodeLink,
    /// Physical element to splice group.
    NodeToSplice,
    /// Splice group to physical element.
    SpliceToNode,
    /// ODF to provider edge.
    OdfLink,
    /// Pole to the mufa hanging on it.
    PoleToMufa,
    /// Cable span between poles.
    Span,
    /// Patch cord.
    Patch,
    /// Anything else the backend sends.
    Other(String),
}

impl EdgeKind {
    /// Parse a wire value, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NODO_LINK" | "NODE_LINK" => EdgeKind::NodeLink,
            "NODO_TO_MUFA" | "NODE_TO_SPLICE" => EdgeKind::NodeToSplice,
            "MUFA_TO_NODO" | "SPLICE_TO_NODE" => EdgeKind::SpliceToNode,
            "ODF_LINK" => EdgeKind::OdfLink,
            "POLE_MUFA" | "POLE_TO_MUFA" => EdgeKind::PoleToMufa,
            "SPAN" => EdgeKind::Span,
            "PATCH" => EdgeKind::Patch,
            _ => EdgeKind::Other(raw.to_string()),
        }
    }

    /// Canonical wire name.
    pub fn as_str(&self) -> &str {
        match self {
            EdgeKind::NodeLink => "NODE_LINK",
            EdgeKind::NodeToSplice => "NODE_TO_SPLICE",
            EdgeKind::SpliceToNode => "SPLICE_TO_NODE",
            EdgeKind::OdfLink => "ODF_LINK",
            EdgeKind::PoleToMufa => "POLE_TO_MUFA",
            EdgeKind::Span => "SPAN",
            EdgeKind::Patch => "PATCH",
            EdgeKind::Other(raw) => raw,
        }
    }
}

impl From<String> for EdgeKind {
    fn from(raw: String) -> Self {
        EdgeKind::parse(&raw)
    }
}

impl From<EdgeKind> for String {
    fn from(kind: EdgeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `fixed` field as sent by the backend: either a flag or per-axis flags.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Fixed {
    Flag(bool),
    Axes { x: bool, y: bool },
}

impl Fixed {
    fn is_locked(self) -> bool {
        match self {
            Fixed::Flag(flag) => flag,
            Fixed::Axes { x, y } => x && y,
        }
    }
}

/// Node record exactly as the backend may send it.
#[derive(Debug, Deserialize)]
struct WireNode {
    id: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    x: Option<f32>,
    #[serde(default)]
    y: Option<f32>,
    #[serde(default)]
    locked: Option<bool>,
    #[serde(default)]
    fixed: Option<Fixed>,
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl From<WireNode> for TopologyNode {
    fn from(wire: WireNode) -> Self {
        let kind = wire
            .kind
            .or(wire.group)
            .map(|raw| NodeKind::parse(&raw))
            .unwrap_or_default();
        let locked = wire
            .locked
            .or_else(|| wire.fixed.map(Fixed::is_locked))
            .unwrap_or(true);

        Self {
            id: wire.id,
            kind,
            label: wire.label,
            x: wire.x,
            y: wire.y,
            locked,
            meta: wire.meta.unwrap_or_default(),
            layer: wire.layer,
            status: wire.status,
        }
    }
}

/// A plant element in a topology snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNode")]
pub struct TopologyNode {
    /// Unique within one snapshot.
    pub id: NodeId,
    /// Element kind.
    pub kind: NodeKind,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Stored X coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// Stored Y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Whether the position is fixed (server-authoritative).
    pub locked: bool,
    /// Opaque attributes.
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    /// Layer name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Operational status, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TopologyNode {
    /// Create a locked node with no position.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            x: None,
            y: None,
            locked: true,
            meta: Meta::new(),
            layer: None,
            status: None,
        }
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the stored position.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Add a meta attribute.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Edge record exactly as the backend may send it.
#[derive(Debug, Deserialize)]
struct WireEdge {
    id: String,
    from: String,
    to: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    edge_kind: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    meta: Option<Meta>,
}

impl From<WireEdge> for TopologyEdge {
    fn from(wire: WireEdge) -> Self {
        let kind = wire
            .kind
            .or(wire.edge_kind)
            .or(wire.group)
            .map(|raw| EdgeKind::parse(&raw))
            .unwrap_or_default();

        Self {
            id: wire.id,
            from: wire.from,
            to: wire.to,
            kind,
            title: wire.title,
            meta: wire.meta.unwrap_or_default(),
        }
    }
}

/// A link between two nodes of the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireEdge")]
pub struct TopologyEdge {
    /// Unique within one snapshot.
    pub id: EdgeId,
    /// Source node id.
    pub from: NodeId,
    /// Destination node id.
    pub to: NodeId,
    /// Link kind.
    pub kind: EdgeKind,
    /// Tooltip / title text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Opaque attributes; `route_id` opens a route on double-click.
    #[serde(skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl TopologyEdge {
    /// Create an edge between two nodes.
    pub fn new(
        id: impl Into<EdgeId>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            kind,
            title: None,
            meta: Meta::new(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a meta attribute.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// The node/edge graph as fetched from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(default)]
    pub nodes: Vec<TopologyNode>,
    #[serde(default)]
    pub edges: Vec<TopologyEdge>,
}

impl TopologySnapshot {
    /// Create a snapshot from nodes and edges.
    pub fn new(nodes: Vec<TopologyNode>, edges: Vec<TopologyEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Whether the snapshot has no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// One entry of the logical route list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from_odf_id: Option<String>,
    #[serde(default)]
    pub to_odf_id: Option<String>,
    #[serde(default)]
    pub path_text: Option<String>,
    #[serde(default)]
    pub span_list: Option<String>,
}

impl RouteSummary {
    /// Human-readable path summary, preferring the path text.
    pub fn summary_text(&self) -> &str {
        self.path_text
            .as_deref()
            .or(self.span_list.as_deref())
            .unwrap_or("")
    }
}

/// Inventory totals for one route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteInventory {
    #[serde(default)]
    pub span_count: Option<u32>,
    #[serde(default)]
    pub total_length_m: Option<f64>,
    #[serde(default)]
    pub pole_count: Option<u32>,
    #[serde(default)]
    pub mufa_count: Option<u32>,
    #[serde(default)]
    pub cables: Vec<String>,
}

/// A node coordinate to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub node_id: NodeId,
    pub x: f32,
    pub y: f32,
}

impl PositionUpdate {
    pub fn new(node_id: impl Into<NodeId>, x: f32, y: f32) -> Self {
        Self {
            node_id: node_id.into(),
            x,
            y,
        }
    }
}
