//! Kind-keyed styling rules for render nodes and edges.

use std::collections::HashMap;

use iced::Color;
use plantview_common::{EdgeKind, NodeKind};

/// Shape used to draw a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    /// Rounded label box.
    Box,
    /// Circle with the label inside.
    Circle,
    /// Small filled dot with the label below.
    Dot,
    /// Diamond with the label below.
    Diamond,
}

/// Visual attributes of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub shape: NodeShape,
    /// Radius (circle/dot/diamond) or half-height (box), in graph units.
    pub size: f32,
    pub fill: Color,
    pub border: Color,
    pub font_color: Color,
    pub font_size: f32,
}

/// Visual attributes of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub color: Color,
    pub dashed: bool,
    pub width: f32,
}

/// Colors applied to the pinned element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightStyle {
    pub fill: Color,
    pub border: Color,
    pub edge_color: Color,
    pub edge_width: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            fill: hex(0xff3b30),
            border: hex(0xb91c1c),
            edge_color: hex(0xff3b30),
            edge_width: 3.0,
        }
    }
}

/// Styling ruleset keyed by kind.
///
/// Lookup is total: kinds without a rule get the sheet's default style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    nodes: HashMap<NodeKind, NodeStyle>,
    edges: HashMap<EdgeKind, EdgeStyle>,
    default_node: NodeStyle,
    default_edge: EdgeStyle,
    highlight: HighlightStyle,
}

impl StyleSheet {
    /// Create a sheet with only default rules.
    pub fn new(default_node: NodeStyle, default_edge: EdgeStyle) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            default_node,
            default_edge,
            highlight: HighlightStyle::default(),
        }
    }

    /// Add or replace the rule for a node kind.
    pub fn with_node_rule(mut self, kind: NodeKind, style: NodeStyle) -> Self {
        self.nodes.insert(kind, style);
        self
    }

    /// Add or replace the rule for an edge kind.
    pub fn with_edge_rule(mut self, kind: EdgeKind, style: EdgeStyle) -> Self {
        self.edges.insert(kind, style);
        self
    }

    /// Network-wide overview vocabulary: physical elements and splice groups.
    pub fn overview() -> Self {
        let physical = NodeStyle {
            shape: NodeShape::Box,
            size: 14.0,
            fill: hex(0xffedd5),
            border: hex(0xff6a00),
            font_color: hex(0x111111),
            font_size: 12.0,
        };
        let splice = NodeStyle {
            shape: NodeShape::Circle,
            size: 8.0,
            fill: hex(0x0f172a),
            border: hex(0x38bdf8),
            font_color: hex(0xe5e7eb),
            font_size: 8.0,
        };
        let link = EdgeStyle {
            color: hex(0x94a3b8),
            dashed: true,
            width: 2.0,
        };
        let splice_link = EdgeStyle {
            color: hex(0x38bdf8),
            dashed: false,
            width: 2.0,
        };

        Self::new(physical, link)
            .with_node_rule(NodeKind::PhysicalElement, physical)
            .with_node_rule(NodeKind::SpliceGroup, splice)
            .with_edge_rule(EdgeKind::NodeToSplice, splice_link)
            .with_edge_rule(EdgeKind::SpliceToNode, splice_link)
    }

    /// Single-route vocabulary: ODFs, poles, mufas, routers and their links.
    pub fn route_detail() -> Self {
        let label = hex(0xe5e7eb);
        let node = |shape, size, color| NodeStyle {
            shape,
            size,
            fill: color,
            border: color,
            font_color: label,
            font_size: 11.0,
        };
        let edge = |color, dashed| EdgeStyle {
            color,
            dashed,
            width: 2.0,
        };
        let span = edge(hex(0x94a3b8), false);

        Self::new(node(NodeShape::Box, 12.0, hex(0x64748b)), span)
            .with_node_rule(NodeKind::Odf, node(NodeShape::Box, 14.0, hex(0x22d3ee)))
            .with_node_rule(NodeKind::Pole, node(NodeShape::Dot, 7.0, hex(0xa5b4fc)))
            .with_node_rule(NodeKind::Mufa, node(NodeShape::Diamond, 10.0, hex(0xf472b6)))
            .with_node_rule(NodeKind::Router, node(NodeShape::Box, 14.0, hex(0x111111)))
            .with_edge_rule(EdgeKind::Span, span)
            .with_edge_rule(EdgeKind::OdfLink, edge(hex(0x22d3ee), true))
            .with_edge_rule(EdgeKind::PoleToMufa, edge(hex(0xf472b6), true))
            .with_edge_rule(EdgeKind::Patch, edge(hex(0x111111), false))
    }

    /// Style for a node kind.
    pub fn node_style(&self, kind: &NodeKind) -> NodeStyle {
        self.nodes.get(kind).copied().unwrap_or(self.default_node)
    }

    /// Style for an edge kind.
    pub fn edge_style(&self, kind: &EdgeKind) -> EdgeStyle {
        self.edges.get(kind).copied().unwrap_or(self.default_edge)
    }

    /// Pinned variant of a node style: keeps shape and size, overrides colors.
    pub fn highlighted_node(&self, base: NodeStyle) -> NodeStyle {
        NodeStyle {
            fill: self.highlight.fill,
            border: self.highlight.border,
            ..base
        }
    }

    /// Pinned variant of an edge style: solid, wider, highlight color.
    pub fn highlighted_edge(&self, base: EdgeStyle) -> EdgeStyle {
        EdgeStyle {
            color: self.highlight.edge_color,
            dashed: false,
            width: self.highlight.edge_width.max(base.width),
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::overview()
    }
}

/// Color from a `0xRRGGBB` literal.
pub fn hex(rgb: u32) -> Color {
    Color::from_rgb8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}
