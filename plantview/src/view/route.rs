//! Single-route detail screen.

use std::time::Duration;

use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Color, Element, Length};

use plantview_common::{EdgeKind, NodeKind, RouteInventory, ViewerConfig};

use super::canvas::CanvasEngine;
use super::details::details_panel;
use super::notifications::{Notifications, notifications_view};
use super::{pane_controls, toolbar_button};
use crate::backend::RouteFetch;
use crate::graph::{GraphPane, PositionBatch, SelectionBehavior, SelectionPayload, StyleSheet};
use crate::message::{GraphMessage, Message};

/// Node layers offered by the layer toolbar.
const NODE_LAYERS: [(NodeKind, &str); 4] = [
    (NodeKind::Router, "Routers"),
    (NodeKind::Odf, "ODFs"),
    (NodeKind::Pole, "Poles"),
    (NodeKind::Mufa, "Mufas"),
];

/// Edge layers offered by the layer toolbar.
const EDGE_LAYERS: [(EdgeKind, &str); 4] = [
    (EdgeKind::Span, "Spans"),
    (EdgeKind::Patch, "Patches"),
    (EdgeKind::OdfLink, "ODF links"),
    (EdgeKind::PoleToMufa, "Pole-Mufa"),
];

/// State of the route detail screen.
#[derive(Debug)]
pub struct RouteView {
    pane: GraphPane<CanvasEngine>,
    route_id: Option<String>,
    inventory: Option<RouteInventory>,
    inventory_error: Option<String>,
    details: Option<SelectionPayload>,
    double_click: Duration,
}

impl RouteView {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            pane: GraphPane::new(StyleSheet::route_detail(), SelectionBehavior::route_detail()),
            route_id: None,
            inventory: None,
            inventory_error: None,
            details: None,
            double_click: config.double_click(),
        }
    }

    pub fn pane(&self) -> &GraphPane<CanvasEngine> {
        &self.pane
    }

    pub fn pane_mut(&mut self) -> &mut GraphPane<CanvasEngine> {
        &mut self.pane
    }

    pub fn mount(&mut self) -> bool {
        let double_click = self.double_click;
        self.pane.mount(|| CanvasEngine::new(double_click))
    }

    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    pub fn inventory(&self) -> Option<&RouteInventory> {
        self.inventory.as_ref()
    }

    /// Whether `route_id` is on screen and loaded without error.
    pub fn shows(&self, route_id: &str) -> bool {
        self.route_id.as_deref() == Some(route_id)
            && !self.pane.is_loading()
            && self.pane.error().is_none()
    }

    /// Switch to another route.
    ///
    /// Selection and pin are reset before the fetch starts, so no pin can
    /// outlive the graph it refers to.
    pub fn open(&mut self, route_id: String) -> u64 {
        tracing::info!(route = %route_id, "Opening route");
        self.pane.reset();
        self.details = None;
        self.inventory = None;
        self.inventory_error = None;
        self.route_id = Some(route_id);
        self.pane.begin_fetch()
    }

    /// Fetch the current route again, keeping the selection.
    pub fn reload(&mut self) -> Option<(u64, String)> {
        let route_id = self.route_id.clone()?;
        Some((self.pane.begin_fetch(), route_id))
    }

    /// Apply a route fetch. Returns `false` if it was superseded.
    pub fn finish_load(&mut self, generation: u64, route_id: &str, fetch: RouteFetch) -> bool {
        if self.route_id.as_deref() != Some(route_id) {
            tracing::debug!(route = %route_id, "Discarding result for another route");
            return false;
        }
        if !self.pane.finish_fetch(generation, fetch.graph) {
            return false;
        }

        match fetch.inventory {
            Ok(inventory) => {
                self.inventory = inventory;
                self.inventory_error = None;
            }
            Err(error) => {
                tracing::error!(route = %route_id, error = %error, "Failed to load route inventory");
                self.inventory_error = Some(error);
            }
        }

        if self.pane.error().is_none() {
            tracing::info!(
                route = %route_id,
                nodes = self.pane.snapshot().nodes.len(),
                edges = self.pane.snapshot().edges.len(),
                "Route loaded"
            );
        }
        true
    }

    pub fn details(&self) -> Option<&SelectionPayload> {
        self.details.as_ref()
    }

    pub fn set_details(&mut self, payload: Option<SelectionPayload>) {
        self.details = payload;
    }

    pub fn update(&mut self, message: GraphMessage) -> Option<PositionBatch> {
        self.pane.update(message)
    }
}

/// Render the route detail screen.
pub fn route_view<'a>(view: &'a RouteView, notifications: &'a Notifications) -> Element<'a, Message> {
    let title = match &view.route_id {
        Some(id) => format!("Route {}", id),
        None => "Route".to_string(),
    };

    let header = row![
        button(text("Back").size(12))
            .on_press(Message::Back)
            .style(iced::widget::button::secondary),
        text(title).size(24),
    ]
    .spacing(20)
    .align_y(Alignment::Center);

    let select_style = if view.pane.selection_state() == crate::graph::SelectionState::SelectArm {
        iced::widget::button::primary
    } else {
        iced::widget::button::secondary
    };

    let mut toolbar = pane_controls(&view.pane, Message::Route)
        .push(
            button(text("Select Mode").size(12))
                .on_press(Message::Route(GraphMessage::ToggleSelectMode))
                .style(select_style),
        )
        .push(toolbar_button(
            "Clear Selection",
            Message::Route(GraphMessage::ClearSelection),
        ))
        .push(toolbar_button("Save All", Message::Route(GraphMessage::SaveAll)));

    let unsaved = view.pane.unsaved_count();
    if unsaved > 0 {
        toolbar = toolbar.push(
            text(format!("{} unsaved", unsaved))
                .size(12)
                .color(Color::from_rgb(0.96, 0.62, 0.04)),
        );
    }
    if view.pane.pending_saves() > 0 {
        toolbar = toolbar.push(text("Saving...").size(12));
    }

    let mut content = column![header, toolbar, layer_toolbar(view)].spacing(10);

    if let Some(error) = view.pane.error() {
        content = content.push(
            text(format!("Failed to load route: {}", error))
                .size(12)
                .color(Color::from_rgb(0.95, 0.35, 0.35)),
        );
    }
    if view.pane.is_loading() {
        content = content.push(text("Loading route...").size(12));
    }

    content = content.push(inventory_summary(view));

    let graph = container(view.pane.view().map(Message::Route))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(container::rounded_box);

    let body = row![graph, details_panel(view.details.as_ref(), Message::Route)]
        .spacing(10)
        .height(Length::Fill);

    content = content.push(body).push(notifications_view(notifications));

    container(content)
        .padding(15)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn layer_toolbar(view: &RouteView) -> Element<'_, Message> {
    let mut layers = row![text("Layers:").size(12)]
        .spacing(6)
        .align_y(Alignment::Center);

    for (kind, label) in NODE_LAYERS {
        let visible = view.pane.is_node_layer_visible(&kind);
        layers = layers.push(layer_button(
            label,
            visible,
            Message::Route(GraphMessage::ToggleNodeLayer(kind)),
        ));
    }
    for (kind, label) in EDGE_LAYERS {
        let visible = view.pane.is_edge_layer_visible(&kind);
        layers = layers.push(layer_button(
            label,
            visible,
            Message::Route(GraphMessage::ToggleEdgeLayer(kind)),
        ));
    }

    layers.into()
}

fn layer_button(label: &str, visible: bool, message: Message) -> Element<'_, Message> {
    let style = if visible {
        iced::widget::button::primary
    } else {
        iced::widget::button::secondary
    };
    button(text(label).size(11))
        .on_press(message)
        .style(style)
        .into()
}

fn inventory_summary(view: &RouteView) -> Element<'_, Message> {
    if let Some(error) = &view.inventory_error {
        return text(format!("Inventory unavailable: {}", error))
            .size(11)
            .color(Color::from_rgb(0.95, 0.35, 0.35))
            .into();
    }
    let Some(inventory) = &view.inventory else {
        return text("No inventory").size(11).into();
    };

    let count = |value: Option<u32>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    let length = inventory
        .total_length_m
        .map_or_else(|| "-".to_string(), |m| format!("{:.1} km", m / 1000.0));
    let cables = if inventory.cables.is_empty() {
        "-".to_string()
    } else {
        inventory.cables.join(", ")
    };

    row![
        text(format!("Spans: {}", count(inventory.span_count))).size(12),
        text(format!("Length: {}", length)).size(12),
        text(format!("Poles: {}", count(inventory.pole_count))).size(12),
        text(format!("Mufas: {}", count(inventory.mufa_count))).size(12),
        text(format!("Cables: {}", cables)).size(12),
    ]
    .spacing(20)
    .into()
}
