//! Application-level tests: message wiring between panes, screens and
//! the mock backend.

use std::sync::Arc;

use plantview::PlantView;
use plantview::backend::{self, Backend};
use plantview::graph::{EngineEvent, Hit, Selected};
use plantview::message::{GraphMessage, Message, Screen};
use plantview::mock::{self, MockBackend};
use plantview::view::notifications::Level;
use plantview::view::route::RouteView;
use plantview_common::{PlantViewConfig, ViewerConfig};

fn app(mock: &Arc<MockBackend>) -> PlantView {
    let backend: Backend = mock.clone();
    let (app, _) = PlantView::new(backend, PlantViewConfig::default());
    app
}

/// Open a route and deliver its fetch result.
async fn open_loaded_route(app: &mut PlantView, mock: &Arc<MockBackend>, route_id: &str) {
    let _ = app.update(Message::OpenRoute(route_id.to_string()));
    let generation = app.route().pane().generation();
    let fetch = backend::fetch_route(mock.clone(), route_id.to_string()).await;
    let _ = app.update(Message::RouteLoaded {
        generation,
        route_id: route_id.to_string(),
        fetch,
    });
}

#[test]
fn test_late_route_result_is_ignored() {
    let mut view = RouteView::new(&ViewerConfig::default());
    view.mount();

    let first = view.open("R1".to_string());
    let second = view.open("R2".to_string());

    let fetch = |route_id: &str| backend::RouteFetch {
        graph: Ok(mock::route_graph(route_id).unwrap()),
        inventory: Ok(mock::inventory(route_id)),
    };
    assert!(view.finish_load(second, "R2", fetch("R2")));
    assert!(!view.finish_load(first, "R1", fetch("R1")));

    assert_eq!(view.route_id(), Some("R2"));
    let graph = view.pane().graph().unwrap();
    assert_eq!(graph.nodes.len(), 3);
    assert!(graph.node("odf:CN-1").is_none());
    assert_eq!(view.inventory().unwrap().span_count, Some(2));
}

#[tokio::test]
async fn test_click_fills_route_details() {
    let mock = Arc::new(MockBackend::new());
    let mut app = app(&mock);
    open_loaded_route(&mut app, &mock, "R1").await;
    assert_eq!(app.screen(), Screen::Route);

    let _ = app.update(Message::Route(GraphMessage::Engine(EngineEvent::Click(
        Hit::Node("pole:11".into()),
    ))));

    let details = app.route().details().expect("details filled");
    assert!(matches!(&details.selected, Selected::Node(node) if node.label == "P-11"));
    assert!(app.overview().details().is_none());
}

#[tokio::test]
async fn test_overview_double_click_opens_route() {
    let mock = Arc::new(MockBackend::new());
    let mut app = app(&mock);
    let generation = app.overview().pane().generation();
    let result = backend::fetch_overview(mock.clone()).await;
    let _ = app.update(Message::OverviewLoaded { generation, result });

    let _ = app.update(Message::Overview(GraphMessage::Engine(
        EngineEvent::DoubleClick(Hit::Edge("route:R2".into())),
    )));

    assert_eq!(app.screen(), Screen::Route);
    assert_eq!(app.route().route_id(), Some("R2"));
    assert_eq!(app.last_route(), Some("R2"));
    assert!(app.route().pane().is_loading());
}

#[tokio::test]
async fn test_switching_route_drops_late_result() {
    let mock = Arc::new(MockBackend::new());
    let mut app = app(&mock);

    let _ = app.update(Message::OpenRoute("R1".to_string()));
    let stale = app.route().pane().generation();
    open_loaded_route(&mut app, &mock, "R2").await;

    let fetch = backend::fetch_route(mock.clone(), "R1".to_string()).await;
    let _ = app.update(Message::RouteLoaded {
        generation: stale,
        route_id: "R1".to_string(),
        fetch,
    });

    assert_eq!(app.route().route_id(), Some("R2"));
    assert_eq!(app.route().pane().graph().unwrap().nodes.len(), 3);
}

#[tokio::test]
async fn test_failed_save_shows_error_notification() {
    let mock = Arc::new(MockBackend::new());
    let mut app = app(&mock);
    open_loaded_route(&mut app, &mock, "R1").await;

    let nodes = vec!["mufa:12".to_string()];
    let _ = app.update(Message::Route(GraphMessage::Engine(EngineEvent::DragStart(
        nodes.clone(),
    ))));
    let _ = app.update(Message::Route(GraphMessage::DragMove {
        nodes: nodes.clone(),
        dx: 20.0,
        dy: 0.0,
    }));
    let _ = app.update(Message::Route(GraphMessage::Engine(EngineEvent::DragEnd(
        nodes,
    ))));
    assert_eq!(app.route().pane().pending_saves(), 1);

    mock.set_fail_saves(true);
    let result = backend::save_positions(mock.clone(), Vec::new()).await;
    let _ = app.update(Message::PositionsSaved {
        screen: Screen::Route,
        batch: 1,
        result,
    });

    let notification = app.notifications().iter().last().expect("notification");
    assert_eq!(notification.level, Level::Error);
    assert!(notification.text.contains("BD_ERROR"));
    assert_eq!(app.route().pane().unsaved_count(), 1);
    assert_eq!(app.route().pane().pending_saves(), 0);
}
