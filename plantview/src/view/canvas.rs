//! Canvas-based rendering engine for topology graphs.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use iced::mouse;
use iced::widget::canvas::{self, Cache, Canvas, Frame, Geometry, LineDash, Path, Stroke, Text};
use iced::{Color, Element, Length, Point, Rectangle, Renderer, Size, Theme};

use plantview_common::{EdgeId, NodeId, PositionUpdate};

use crate::graph::style::hex;
use crate::graph::{
    EdgePatch, EdgeStyle, EngineEvent, GraphPane, Hit, NodePatch, NodeShape, PositionBatch,
    RenderEngine, RenderGraph, RenderNode,
};
use crate::message::GraphMessage;

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 4.0;
/// Screen distance a press must travel before it becomes a drag.
const DRAG_THRESHOLD: f32 = 4.0;
/// Screen distance within which a click hits an edge.
const EDGE_HIT: f32 = 6.0;
const FIT_MARGIN: f32 = 40.0;
const FALLBACK_VIEWPORT: Size = Size::new(1024.0, 720.0);

static DASH: [f32; 2] = [6.0, 4.0];

/// Draws a [`RenderGraph`] on an iced canvas and owns node positions.
#[derive(Debug)]
pub struct CanvasEngine {
    graph: RenderGraph,
    /// Graph-space coordinates of the displayed nodes. A node without a
    /// stored position keeps its previous one across `set_data`.
    positions: HashMap<NodeId, Point>,
    zoom: f32,
    pan: (f32, f32),
    viewport: Size,
    double_click: Duration,
    cache: Cache,
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(400))
    }
}

impl CanvasEngine {
    /// Create an engine with the given double-click window.
    pub fn new(double_click: Duration) -> Self {
        Self {
            graph: RenderGraph::default(),
            positions: HashMap::new(),
            zoom: 1.0,
            pan: (0.0, 0.0),
            viewport: Size::ZERO,
            double_click,
            cache: Cache::new(),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> (f32, f32) {
        self.pan
    }

    /// Graph-space position of a node.
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    /// Move free nodes by a graph-space delta. Locked nodes stay put.
    pub fn drag_by(&mut self, ids: &[NodeId], dx: f32, dy: f32) {
        let mut moved = false;
        for id in ids {
            if !self.graph.node(id).is_some_and(|n| !n.locked) {
                continue;
            }
            if let Some(pos) = self.positions.get_mut(id) {
                pos.x += dx;
                pos.y += dy;
                moved = true;
            }
        }
        if moved {
            self.cache.clear();
        }
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.0 += dx;
        self.pan.1 += dy;
        self.cache.clear();
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.2).min(MAX_ZOOM);
        self.cache.clear();
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.2).max(MIN_ZOOM);
        self.cache.clear();
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.pan = (0.0, 0.0);
        self.cache.clear();
    }

    /// Record the canvas size. The first known size re-fits the graph.
    pub fn set_viewport(&mut self, size: Size) {
        let first = self.viewport == Size::ZERO;
        self.viewport = size;
        if first {
            self.fit();
        } else {
            self.cache.clear();
        }
    }

    /// The canvas widget.
    pub fn view(&self) -> Element<'_, GraphMessage> {
        Canvas::new(GraphCanvas { engine: self })
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// What lies under a graph-space point. Nodes win over edges.
    pub fn hit_test(&self, pos: Point) -> Hit {
        Hit::resolve(self.node_at(pos), self.edge_at(pos))
    }

    fn node_at(&self, pos: Point) -> Option<NodeId> {
        // Topmost first: nodes are drawn in graph order.
        self.graph.nodes.iter().rev().find_map(|node| {
            let center = self.positions.get(&node.id)?;
            let (dx, dy) = ((pos.x - center.x).abs(), (pos.y - center.y).abs());
            let hit = match node.style.shape {
                NodeShape::Box => {
                    let extent = node_extent(node);
                    dx <= extent.width && dy <= extent.height
                }
                _ => (dx * dx + dy * dy).sqrt() <= node.style.size + 3.0,
            };
            hit.then(|| node.id.clone())
        })
    }

    fn edge_at(&self, pos: Point) -> Option<EdgeId> {
        let tolerance = EDGE_HIT / self.zoom;
        self.graph
            .edges
            .iter()
            .rev()
            .filter_map(|edge| {
                let from = self.positions.get(&edge.from)?;
                let to = self.positions.get(&edge.to)?;
                let distance = segment_distance(pos, *from, *to);
                (distance <= tolerance).then_some((distance, edge))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, edge)| edge.id.clone())
    }

    fn to_screen(&self, pos: Point, size: Size) -> Point {
        Point::new(
            size.width / 2.0 + (pos.x + self.pan.0) * self.zoom,
            size.height / 2.0 + (pos.y + self.pan.1) * self.zoom,
        )
    }

    fn to_graph(&self, pos: Point, size: Size) -> Point {
        Point::new(
            (pos.x - size.width / 2.0) / self.zoom - self.pan.0,
            (pos.y - size.height / 2.0) / self.zoom - self.pan.1,
        )
    }

    fn draw_graph(&self, frame: &mut Frame, size: Size) {
        frame.fill(
            &Path::rectangle(Point::ORIGIN, size),
            Color::from_rgb(0.08, 0.08, 0.1),
        );

        for edge in &self.graph.edges {
            let (Some(from), Some(to)) = (
                self.positions.get(&edge.from),
                self.positions.get(&edge.to),
            ) else {
                continue;
            };
            let from = self.to_screen(*from, size);
            let to = self.to_screen(*to, size);

            let mut path = canvas::path::Builder::new();
            path.move_to(from);
            path.line_to(to);
            frame.stroke(&path.build(), edge_stroke(&edge.style, self.zoom));

            if !edge.title.is_empty() && self.zoom >= 0.6 {
                frame.fill_text(Text {
                    content: edge.title.clone(),
                    position: Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0 - 8.0),
                    color: Color::from_rgb(0.7, 0.7, 0.7),
                    size: (10.0 * self.zoom).max(8.0).into(),
                    align_x: iced::alignment::Horizontal::Center.into(),
                    ..Text::default()
                });
            }
        }

        for node in &self.graph.nodes {
            self.draw_node(frame, node, size);
        }

        if self.graph.is_empty() {
            frame.fill_text(Text {
                content: "No topology loaded".to_string(),
                position: Point::new(size.width / 2.0, size.height / 2.0),
                color: Color::from_rgb(0.5, 0.5, 0.5),
                size: 16.0.into(),
                align_x: iced::alignment::Horizontal::Center.into(),
                align_y: iced::alignment::Vertical::Center.into(),
                ..Text::default()
            });
        }

        frame.fill_text(Text {
            content: format!("Zoom: {}%", (self.zoom * 100.0) as i32),
            position: Point::new(10.0, size.height - 20.0),
            color: Color::from_rgb(0.4, 0.4, 0.4),
            size: 12.0.into(),
            ..Text::default()
        });
    }

    fn draw_node(&self, frame: &mut Frame, node: &RenderNode, size: Size) {
        let Some(pos) = self.positions.get(&node.id) else {
            return;
        };
        let center = self.to_screen(*pos, size);
        let style = node.style;
        let radius = style.size * self.zoom;
        let border = Stroke::default().with_color(style.border).with_width(2.0);

        let label_inside = match style.shape {
            NodeShape::Box => {
                let extent = node_extent(node);
                let half = Size::new(extent.width * self.zoom, extent.height * self.zoom);
                let rect = Path::rectangle(
                    Point::new(center.x - half.width, center.y - half.height),
                    Size::new(half.width * 2.0, half.height * 2.0),
                );
                frame.fill(&rect, style.fill);
                frame.stroke(&rect, border);
                true
            }
            NodeShape::Circle => {
                let circle = Path::circle(center, radius);
                frame.fill(&circle, style.fill);
                frame.stroke(&circle, border);
                true
            }
            NodeShape::Dot => {
                frame.fill(&Path::circle(center, radius), style.fill);
                false
            }
            NodeShape::Diamond => {
                let mut path = canvas::path::Builder::new();
                path.move_to(Point::new(center.x, center.y - radius));
                path.line_to(Point::new(center.x + radius, center.y));
                path.line_to(Point::new(center.x, center.y + radius));
                path.line_to(Point::new(center.x - radius, center.y));
                path.close();
                let diamond = path.build();
                frame.fill(&diamond, style.fill);
                frame.stroke(&diamond, border);
                false
            }
        };

        if node.unsaved {
            let marker = Path::circle(Point::new(center.x + radius, center.y - radius), 4.0);
            frame.fill(&marker, hex(0xf59e0b));
        }

        if node.label.is_empty() {
            return;
        }
        let (position, color, align_y) = if label_inside {
            (center, style.font_color, iced::alignment::Vertical::Center)
        } else {
            (
                Point::new(center.x, center.y + radius + 4.0),
                Color::WHITE,
                iced::alignment::Vertical::Top,
            )
        };
        frame.fill_text(Text {
            content: node.label.clone(),
            position,
            color,
            size: (style.font_size * self.zoom).max(8.0).into(),
            align_x: iced::alignment::Horizontal::Center.into(),
            align_y: align_y.into(),
            ..Text::default()
        });
    }
}

impl RenderEngine for CanvasEngine {
    fn set_data(&mut self, graph: RenderGraph) {
        let present: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        self.positions.retain(|id, _| present.contains(id.as_str()));

        let unplaced: Vec<NodeId> = graph
            .nodes
            .iter()
            .filter(|n| (n.x.is_none() || n.y.is_none()) && !self.positions.contains_key(&n.id))
            .map(|n| n.id.clone())
            .collect();

        for node in &graph.nodes {
            if let (Some(x), Some(y)) = (node.x, node.y) {
                self.positions.insert(node.id.clone(), Point::new(x, y));
            }
        }

        // Nodes with no position at all start on a circle.
        if !unplaced.is_empty() {
            let radius = (unplaced.len() as f32 * 30.0).max(200.0);
            let step = std::f32::consts::TAU / unplaced.len() as f32;
            for (i, id) in unplaced.into_iter().enumerate() {
                let angle = i as f32 * step;
                self.positions
                    .insert(id, Point::new(radius * angle.cos(), radius * angle.sin()));
            }
        }

        self.graph = graph;
        self.cache.clear();
    }

    fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    fn positions(&self, ids: &[NodeId]) -> Vec<PositionUpdate> {
        ids.iter()
            .filter(|id| self.graph.node(id).is_some())
            .filter_map(|id| {
                let pos = self.positions.get(id)?;
                Some(PositionUpdate::new(id.clone(), pos.x, pos.y))
            })
            .collect()
    }

    fn all_positions(&self) -> Vec<PositionUpdate> {
        self.graph
            .nodes
            .iter()
            .filter_map(|node| {
                let pos = self.positions.get(&node.id)?;
                Some(PositionUpdate::new(node.id.clone(), pos.x, pos.y))
            })
            .collect()
    }

    fn fit(&mut self) {
        let mut points = self
            .graph
            .nodes
            .iter()
            .filter_map(|n| self.positions.get(&n.id));
        let Some(first) = points.next() else {
            self.reset_zoom();
            return;
        };

        let (mut min, mut max) = (*first, *first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }

        let viewport = if self.viewport.width > 0.0 && self.viewport.height > 0.0 {
            self.viewport
        } else {
            FALLBACK_VIEWPORT
        };
        let width = (max.x - min.x) + 2.0 * FIT_MARGIN;
        let height = (max.y - min.y) + 2.0 * FIT_MARGIN;

        self.zoom = (viewport.width / width)
            .min(viewport.height / height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = (-(min.x + max.x) / 2.0, -(min.y + max.y) / 2.0);
        self.cache.clear();
    }

    fn update_node(&mut self, id: &str, patch: NodePatch) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        if let Some(locked) = patch.locked {
            node.locked = locked;
        }
        if let Some(unsaved) = patch.unsaved {
            node.unsaved = unsaved;
        }
        if let Some(style) = patch.style {
            node.style = style;
        }
        self.cache.clear();
        true
    }

    fn update_edge(&mut self, id: &str, patch: EdgePatch) -> bool {
        let Some(edge) = self.graph.edge_mut(id) else {
            return false;
        };
        if let Some(style) = patch.style {
            edge.style = style;
        }
        self.cache.clear();
        true
    }
}

impl GraphPane<CanvasEngine> {
    /// Apply a canvas or toolbar message. Returns a batch to save, if any.
    ///
    /// `Reload` needs a fetch and is left to the screen.
    pub fn update(&mut self, message: GraphMessage) -> Option<PositionBatch> {
        match message {
            GraphMessage::Engine(event) => return self.handle(event),
            GraphMessage::SaveAll => return self.save_all(),
            GraphMessage::DragMove { nodes, dx, dy } => {
                if let Some(engine) = self.engine_mut() {
                    engine.drag_by(&nodes, dx, dy);
                }
            }
            GraphMessage::Pan(dx, dy) => {
                if let Some(engine) = self.engine_mut() {
                    engine.pan_by(dx, dy);
                }
            }
            GraphMessage::ZoomIn => {
                if let Some(engine) = self.engine_mut() {
                    engine.zoom_in();
                }
            }
            GraphMessage::ZoomOut => {
                if let Some(engine) = self.engine_mut() {
                    engine.zoom_out();
                }
            }
            GraphMessage::ZoomReset => {
                if let Some(engine) = self.engine_mut() {
                    engine.reset_zoom();
                }
            }
            GraphMessage::Resized(size) => {
                if let Some(engine) = self.engine_mut() {
                    engine.set_viewport(size);
                }
            }
            GraphMessage::Fit => self.fit(),
            GraphMessage::ClearSelection => self.clear_selection(),
            GraphMessage::ToggleSelectMode => {
                self.toggle_select_mode();
            }
            GraphMessage::ToggleDragLock => {
                self.toggle_drag_lock();
            }
            GraphMessage::ToggleNodeLayer(kind) => {
                self.toggle_node_layer(kind);
            }
            GraphMessage::ToggleEdgeLayer(kind) => {
                self.toggle_edge_layer(kind);
            }
            GraphMessage::Reload => {}
        }
        None
    }

    /// The canvas, or a placeholder before the engine is mounted.
    pub fn view(&self) -> Element<'_, GraphMessage> {
        match self.engine() {
            Some(engine) => engine.view(),
            None => iced::widget::text("Loading...").into(),
        }
    }
}

/// Half-extent of a node in graph units.
fn node_extent(node: &RenderNode) -> Size {
    match node.style.shape {
        NodeShape::Box => {
            let text = node.label.chars().count() as f32 * node.style.font_size * 0.6;
            Size::new((text / 2.0 + 8.0).max(node.style.size), node.style.size)
        }
        _ => Size::new(node.style.size, node.style.size),
    }
}

fn edge_stroke(style: &EdgeStyle, zoom: f32) -> Stroke<'static> {
    let stroke = Stroke::default()
        .with_color(style.color)
        .with_width((style.width * zoom).max(1.0));
    if style.dashed {
        Stroke {
            line_dash: LineDash {
                segments: &DASH,
                offset: 0,
            },
            ..stroke
        }
    } else {
        stroke
    }
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Canvas program for the graph.
struct GraphCanvas<'a> {
    engine: &'a CanvasEngine,
}

/// Pointer state between canvas events.
#[derive(Debug, Default)]
pub struct Interaction {
    press: Option<Press>,
    last_click: Option<(Instant, Hit)>,
    /// Nodes shift-clicked together; dragging one drags all.
    group: Vec<NodeId>,
    shift: bool,
    size: Option<Size>,
}

#[derive(Debug, Clone)]
struct Press {
    origin: Point,
    last: Point,
    hit: Hit,
    nodes: Vec<NodeId>,
    dragging: bool,
}

impl<'a> canvas::Program<GraphMessage> for GraphCanvas<'a> {
    type State = Interaction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<GraphMessage>> {
        match event {
            canvas::Event::Mouse(mouse_event) => {
                self.handle_mouse(interaction, mouse_event, bounds, cursor)
            }
            canvas::Event::Keyboard(keyboard_event) => {
                self.handle_keyboard(interaction, keyboard_event)
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        interaction: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let graph = self.engine.cache.draw(renderer, bounds.size(), |frame| {
            self.engine.draw_graph(frame, bounds.size());
        });

        let mut overlay = Frame::new(renderer, bounds.size());
        for id in &interaction.group {
            let (Some(node), Some(pos)) = (self.engine.graph.node(id), self.engine.position(id))
            else {
                continue;
            };
            let center = self.engine.to_screen(pos, bounds.size());
            let extent = node_extent(node);
            let ring = Path::circle(center, extent.width.max(extent.height) * self.engine.zoom + 5.0);
            overlay.stroke(
                &ring,
                Stroke::default()
                    .with_color(Color::from_rgb(1.0, 0.8, 0.2))
                    .with_width(2.0),
            );
        }

        vec![graph, overlay.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if interaction.press.as_ref().is_some_and(|p| p.dragging) {
            mouse::Interaction::Grabbing
        } else if let Some(pos) = cursor.position_in(bounds) {
            match self.engine.hit_test(self.engine.to_graph(pos, bounds.size())) {
                Hit::Canvas => mouse::Interaction::Grab,
                _ => mouse::Interaction::Pointer,
            }
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a> GraphCanvas<'a> {
    fn handle_mouse(
        &self,
        interaction: &mut Interaction,
        event: &mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<GraphMessage>> {
        match event {
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                let pos = cursor.position_in(bounds)?;
                let hit = self
                    .engine
                    .hit_test(self.engine.to_graph(pos, bounds.size()));
                let nodes = match &hit {
                    Hit::Node(id) if interaction.group.contains(id) => interaction.group.clone(),
                    Hit::Node(id) => vec![id.clone()],
                    _ => Vec::new(),
                };
                interaction.press = Some(Press {
                    origin: pos,
                    last: pos,
                    hit,
                    nodes,
                    dragging: false,
                });
                None
            }
            mouse::Event::CursorMoved { position } => {
                if interaction.size != Some(bounds.size()) {
                    interaction.size = Some(bounds.size());
                    return Some(canvas::Action::publish(GraphMessage::Resized(bounds.size())));
                }

                let press = interaction.press.as_mut()?;
                let pos = Point::new(position.x - bounds.x, position.y - bounds.y);

                if !press.dragging {
                    if press.origin.distance(pos) < DRAG_THRESHOLD {
                        return None;
                    }
                    press.dragging = true;
                    if !press.nodes.is_empty() {
                        return Some(canvas::Action::publish(GraphMessage::Engine(
                            EngineEvent::DragStart(press.nodes.clone()),
                        )));
                    }
                }

                let dx = (pos.x - press.last.x) / self.engine.zoom;
                let dy = (pos.y - press.last.y) / self.engine.zoom;
                press.last = pos;

                let message = if press.nodes.is_empty() {
                    GraphMessage::Pan(dx, dy)
                } else {
                    GraphMessage::DragMove {
                        nodes: press.nodes.clone(),
                        dx,
                        dy,
                    }
                };
                Some(canvas::Action::publish(message))
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                let press = interaction.press.take()?;
                if press.dragging {
                    if press.nodes.is_empty() {
                        return None;
                    }
                    return Some(canvas::Action::publish(GraphMessage::Engine(
                        EngineEvent::DragEnd(press.nodes),
                    )));
                }
                Some(self.click(interaction, press.hit))
            }
            mouse::Event::WheelScrolled { delta } => {
                if !cursor.is_over(bounds) {
                    return None;
                }
                let scroll = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => *y,
                    mouse::ScrollDelta::Pixels { y, .. } => *y / 50.0,
                };

                if scroll > 0.0 {
                    Some(canvas::Action::publish(GraphMessage::ZoomIn))
                } else if scroll < 0.0 {
                    Some(canvas::Action::publish(GraphMessage::ZoomOut))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// A press released without moving: click or double-click.
    fn click(&self, interaction: &mut Interaction, hit: Hit) -> canvas::Action<GraphMessage> {
        let now = Instant::now();
        if let Some((at, previous)) = interaction.last_click.take() {
            if previous == hit && now.duration_since(at) <= self.engine.double_click {
                return canvas::Action::publish(GraphMessage::Engine(EngineEvent::DoubleClick(
                    hit,
                )));
            }
        }

        match &hit {
            Hit::Node(id) if interaction.shift => {
                if let Some(index) = interaction.group.iter().position(|n| n == id) {
                    interaction.group.remove(index);
                } else {
                    interaction.group.push(id.clone());
                }
            }
            _ => interaction.group.clear(),
        }

        interaction.last_click = Some((now, hit.clone()));
        canvas::Action::publish(GraphMessage::Engine(EngineEvent::Click(hit)))
    }

    fn handle_keyboard(
        &self,
        interaction: &mut Interaction,
        event: &iced::keyboard::Event,
    ) -> Option<canvas::Action<GraphMessage>> {
        use iced::keyboard::{Event, Key, key::Named};

        let message = match event {
            Event::ModifiersChanged(modifiers) => {
                interaction.shift = modifiers.shift();
                return None;
            }
            Event::KeyPressed { key, .. } => match key {
                Key::Character(c) if c.as_str() == "+" || c.as_str() == "=" => GraphMessage::ZoomIn,
                Key::Character(c) if c.as_str() == "-" => GraphMessage::ZoomOut,
                Key::Character(c) if c.as_str() == "0" => GraphMessage::ZoomReset,
                Key::Character(c) if c.as_str() == "f" => GraphMessage::Fit,
                Key::Named(Named::Escape) => {
                    interaction.group.clear();
                    GraphMessage::ClearSelection
                }
                _ => return None,
            },
            _ => return None,
        };

        Some(canvas::Action::publish(message))
    }
}
