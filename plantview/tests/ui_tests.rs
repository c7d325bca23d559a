//! UI tests using iced_test Simulator.
//!
//! These tests verify the UI behavior without a running topology backend.

use std::time::Duration;

use iced_test::simulator;

use plantview::backend::RouteFetch;
use plantview::graph::{
    LayerFilter, Pin, Selected, SelectedEdge, SelectedNode, SelectionPayload, StyleSheet, adapt,
};
use plantview::message::{GraphMessage, Message};
use plantview::mock;
use plantview::view::details::details_panel;
use plantview::view::notifications::{Notifications, notifications_view};
use plantview::view::overview::{OverviewView, overview_view};
use plantview::view::route::{RouteView, route_view};
use plantview::view::route_list::{RouteListState, route_list_view};
use plantview_common::ViewerConfig;

fn overview_edge_payload(edge_id: &str) -> SelectionPayload {
    let graph = adapt(&mock::overview(), &StyleSheet::overview(), &LayerFilter::default());
    SelectionPayload {
        selected: Selected::Edge(SelectedEdge::from(graph.edge(edge_id).unwrap())),
        pinned: None,
    }
}

fn loaded_route(route_id: &str) -> RouteView {
    let mut view = RouteView::new(&ViewerConfig::default());
    view.mount();
    let generation = view.open(route_id.to_string());
    let fetch = RouteFetch {
        graph: Ok(mock::route_graph(route_id).unwrap()),
        inventory: Ok(mock::inventory(route_id)),
    };
    assert!(view.finish_load(generation, route_id, fetch));
    view
}

/// Test that the details panel shows its empty state.
#[test]
fn test_details_empty() {
    let mut ui = simulator(details_panel(None, Message::Overview));

    assert!(ui.find("Click a node or edge to see its details").is_ok());
}

/// Test that a route edge offers to open its route.
#[test]
fn test_details_open_route_button() {
    let payload = overview_edge_payload("route:R1");
    let mut ui = simulator(details_panel(Some(&payload), Message::Overview));

    assert!(ui.find("R1 Norte - Sur").is_ok());
    assert!(ui.find("route_id: R1").is_ok());

    let _ = ui.click("Open route R1");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::OpenRoute(id) if id == "R1"))
    );
}

/// Test that an edge without a route has no open button.
#[test]
fn test_details_splice_edge_has_no_route() {
    let payload = overview_edge_payload("101->mufa:77");
    let mut ui = simulator(details_panel(Some(&payload), Message::Overview));

    assert!(ui.find("1 ruta").is_ok());
    assert!(ui.find("Open route R1").is_err());
}

/// Test the pin line and the clear button of the details panel.
#[test]
fn test_details_pinned_node() {
    let graph = adapt(
        &mock::route_graph("R1").unwrap(),
        &StyleSheet::route_detail(),
        &LayerFilter::default(),
    );
    let payload = SelectionPayload {
        selected: Selected::Node(SelectedNode::from(graph.node("pole:12").unwrap())),
        pinned: Some(Pin::edge("span:S-12")),
    };
    let mut ui = simulator(details_panel(Some(&payload), Message::Route));

    assert!(ui.find("P-12").is_ok());
    assert!(ui.find("Pinned edge span:S-12").is_ok());

    let _ = ui.click("Clear Selection");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::Route(GraphMessage::ClearSelection)))
    );
}

/// Test clicking a route in the route list.
#[test]
fn test_route_list_opens_route() {
    let mut state = RouteListState::default();
    state.finish_load(Ok(mock::routes()));
    let mut ui = simulator(route_list_view(&state, None));

    assert!(ui.find("ODF-CN-1 -> ODF-CS-1").is_ok());
    assert!(ui.find("S-21, S-22").is_ok());

    let _ = ui.click("R2");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::OpenRoute(id) if id == "R2"))
    );
}

/// Test the route list reload button.
#[test]
fn test_route_list_reload() {
    let state = RouteListState::default();
    let mut ui = simulator(route_list_view(&state, None));

    assert!(ui.find("No routes").is_ok());
    let _ = ui.click("Reload");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(messages.iter().any(|m| matches!(m, Message::ReloadRoutes)));
}

/// Test the overview header and last-route shortcut.
#[test]
fn test_overview_last_route() {
    let mut view = OverviewView::new(&ViewerConfig::default());
    view.mount();
    let generation = view.begin_load();
    view.finish_load(generation, Ok(mock::overview()));

    let routes = RouteListState::default();
    let notifications = Notifications::new(Duration::from_secs(5));
    let mut ui = simulator(overview_view(&view, &routes, Some("R1"), &notifications));

    assert!(ui.find("Plant Overview").is_ok());
    assert!(ui.find("4 nodes, 4 edges").is_ok());

    let _ = ui.click("Last route: R1");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::OpenRoute(id) if id == "R1"))
    );
}

/// Test that a failed overview fetch is shown inline.
#[test]
fn test_overview_fetch_error_banner() {
    let mut view = OverviewView::new(&ViewerConfig::default());
    view.mount();
    let generation = view.begin_load();
    view.finish_load(generation, Err("HTTP 503: unavailable".into()));

    let routes = RouteListState::default();
    let notifications = Notifications::new(Duration::from_secs(5));
    let mut ui = simulator(overview_view(&view, &routes, None, &notifications));

    assert!(ui.find("Failed to load overview: HTTP 503: unavailable").is_ok());
}

/// Test the route view toolbar and inventory summary.
#[test]
fn test_route_view_toolbar() {
    let view = loaded_route("R1");
    let notifications = Notifications::new(Duration::from_secs(5));
    let mut ui = simulator(route_view(&view, &notifications));

    assert!(ui.find("Route R1").is_ok());
    assert!(ui.find("Spans: 4").is_ok());
    assert!(ui.find("Poles: 3").is_ok());
    assert!(ui.find("Cables: CBL-R1-48").is_ok());

    let _ = ui.click("Select Mode");
    let _ = ui.click("Save All");
    let _ = ui.click("Back");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::Route(GraphMessage::ToggleSelectMode)))
    );
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::Route(GraphMessage::SaveAll)))
    );
    assert!(messages.iter().any(|m| matches!(m, Message::Back)));
}

/// Test the layer toggle buttons.
#[test]
fn test_route_view_layer_toggle() {
    let view = loaded_route("R1");
    let notifications = Notifications::new(Duration::from_secs(5));
    let mut ui = simulator(route_view(&view, &notifications));

    let _ = ui.click("Poles");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(messages.iter().any(|m| matches!(
        m,
        Message::Route(GraphMessage::ToggleNodeLayer(plantview_common::NodeKind::Pole))
    )));
}

/// Test dismissing a notification.
#[test]
fn test_notification_dismiss() {
    let mut notifications = Notifications::new(Duration::from_secs(5));
    let id = notifications.error("Could not save positions");
    let mut ui = simulator(notifications_view(&notifications));

    assert!(ui.find("Could not save positions").is_ok());
    let _ = ui.click("x");

    let messages: Vec<Message> = ui.into_messages().collect();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::DismissNotification(n) if *n == id))
    );
}
