//! Whole-network overview screen.

use std::time::Duration;

use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Color, Element, Length};

use plantview_common::{TopologySnapshot, ViewerConfig};

use super::canvas::CanvasEngine;
use super::details::details_panel;
use super::notifications::{Notifications, notifications_view};
use super::pane_controls;
use super::route_list::{RouteListState, route_list_view};
use crate::graph::{GraphPane, PositionBatch, SelectionBehavior, SelectionPayload, StyleSheet};
use crate::message::{GraphMessage, Message};

/// State of the overview screen.
#[derive(Debug)]
pub struct OverviewView {
    pane: GraphPane<CanvasEngine>,
    details: Option<SelectionPayload>,
    double_click: Duration,
}

impl OverviewView {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            pane: GraphPane::new(StyleSheet::overview(), SelectionBehavior::overview()),
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

    /// Create the canvas engine. A second call keeps the existing one.
    pub fn mount(&mut self) -> bool {
        let double_click = self.double_click;
        self.pane.mount(|| CanvasEngine::new(double_click))
    }

    /// Start fetching the overview graph.
    pub fn begin_load(&mut self) -> u64 {
        self.pane.begin_fetch()
    }

    pub fn finish_load(&mut self, generation: u64, result: Result<TopologySnapshot, String>) -> bool {
        let applied = self.pane.finish_fetch(generation, result);
        if applied && self.pane.error().is_none() {
            tracing::info!(
                nodes = self.pane.snapshot().nodes.len(),
                edges = self.pane.snapshot().edges.len(),
                "Overview loaded"
            );
        }
        applied
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

/// Render the overview screen.
pub fn overview_view<'a>(
    view: &'a OverviewView,
    routes: &'a RouteListState,
    last_route: Option<&'a str>,
    notifications: &'a Notifications,
) -> Element<'a, Message> {
    let (nodes, edges) = view
        .pane
        .graph()
        .map(|g| (g.nodes.len(), g.edges.len()))
        .unwrap_or((0, 0));

    let mut header = row![
        text("Plant Overview").size(24),
        text(format!("{} nodes, {} edges", nodes, edges)).size(12),
    ]
    .spacing(20)
    .align_y(Alignment::Center);

    if let Some(route) = last_route {
        header = header.push(
            button(text(format!("Last route: {}", route)).size(12))
                .on_press(Message::OpenRoute(route.to_string()))
                .style(iced::widget::button::primary),
        );
    }

    let toolbar = pane_controls(&view.pane, Message::Overview);

    let mut content = column![header, toolbar].spacing(10);

    if let Some(error) = view.pane.error() {
        content = content.push(
            text(format!("Failed to load overview: {}", error))
                .size(12)
                .color(Color::from_rgb(0.95, 0.35, 0.35)),
        );
    }
    if view.pane.is_loading() {
        content = content.push(text("Loading overview...").size(12));
    }

    let graph = container(view.pane.view().map(Message::Overview))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(container::rounded_box);

    let body = row![
        route_list_view(routes, last_route),
        graph,
        details_panel(view.details.as_ref(), Message::Overview),
    ]
    .spacing(10)
    .height(Length::Fill);

    content = content.push(body).push(notifications_view(notifications));

    container(content)
        .padding(15)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
