//! PlantView iced application.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use iced::{Element, Subscription, Task, Theme};

use plantview_common::PlantViewConfig;

use crate::backend::{self, Backend};
use crate::graph::{GraphPane, PositionBatch, SaveOutcome};
use crate::message::{GraphMessage, Message, Screen};
use crate::subscription::tick_subscription;
use crate::view::canvas::CanvasEngine;
use crate::view::notifications::Notifications;
use crate::view::overview::{OverviewView, overview_view};
use crate::view::route::{RouteView, route_view};
use crate::view::route_list::RouteListState;

/// Messages produced by pane listeners while an update runs.
type Outbox = Rc<RefCell<Vec<Message>>>;

/// The main PlantView application.
pub struct PlantView {
    backend: Backend,
    screen: Screen,
    overview: OverviewView,
    route: RouteView,
    routes: RouteListState,
    notifications: Notifications,
    /// Most recently opened route.
    last_route: Option<String>,
    outbox: Outbox,
}

impl PlantView {
    /// Build the application and start the initial fetches.
    pub fn new(backend: Backend, config: PlantViewConfig) -> (Self, Task<Message>) {
        let mut app = Self {
            backend,
            screen: Screen::Overview,
            overview: OverviewView::new(&config.viewer),
            route: RouteView::new(&config.viewer),
            routes: RouteListState::default(),
            notifications: Notifications::new(config.viewer.notification_ttl()),
            last_route: None,
            outbox: Rc::new(RefCell::new(Vec::new())),
        };

        app.overview.mount();
        app.route.mount();
        app.install_listeners();

        let task = Task::batch([app.load_overview(), app.load_routes()]);
        (app, task)
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn overview(&self) -> &OverviewView {
        &self.overview
    }

    pub fn route(&self) -> &RouteView {
        &self.route
    }

    pub fn routes(&self) -> &RouteListState {
        &self.routes
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn last_route(&self) -> Option<&str> {
        self.last_route.as_deref()
    }

    /// Get the window title.
    pub fn title(&self) -> String {
        match (self.screen, self.route.route_id()) {
            (Screen::Route, Some(id)) => format!("PlantView - Route {}", id),
            _ => "PlantView".to_string(),
        }
    }

    /// Handle incoming messages.
    ///
    /// Messages the pane listeners queue while handling `message` are
    /// handled before returning, so the details panel and route switches
    /// follow the click that caused them.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        let mut tasks = vec![self.handle(message)];
        loop {
            let queued: Vec<Message> = self.outbox.borrow_mut().drain(..).collect();
            if queued.is_empty() {
                break;
            }
            for message in queued {
                tasks.push(self.handle(message));
            }
        }
        Task::batch(tasks)
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Overview(GraphMessage::Reload) => self.load_overview(),

            Message::Route(GraphMessage::Reload) => match self.route.reload() {
                Some((generation, route_id)) => self.fetch_route(generation, route_id),
                None => Task::none(),
            },

            Message::Overview(message) => {
                let batch = self.overview.update(message);
                self.save(Screen::Overview, batch)
            }

            Message::Route(message) => {
                let batch = self.route.update(message);
                self.save(Screen::Route, batch)
            }

            Message::OverviewLoaded { generation, result } => {
                self.overview.finish_load(generation, result);
                Task::none()
            }

            Message::RouteLoaded {
                generation,
                route_id,
                fetch,
            } => {
                self.route.finish_load(generation, &route_id, fetch);
                Task::none()
            }

            Message::RoutesLoaded(result) => {
                self.routes.finish_load(result);
                Task::none()
            }

            Message::PositionsSaved {
                screen,
                batch,
                result,
            } => {
                self.handle_saved(screen, batch, result);
                Task::none()
            }

            Message::Selected { screen, payload } => {
                match screen {
                    Screen::Overview => self.overview.set_details(payload),
                    Screen::Route => self.route.set_details(payload),
                }
                Task::none()
            }

            Message::OpenRoute(route_id) => self.open_route(route_id),

            Message::Back => {
                self.screen = Screen::Overview;
                Task::none()
            }

            Message::ReloadRoutes => self.load_routes(),

            Message::DismissNotification(id) => {
                self.notifications.dismiss(id);
                Task::none()
            }

            Message::Tick => {
                self.notifications.expire(Instant::now());
                Task::none()
            }
        }
    }

    /// Periodic tick for notification expiry.
    pub fn subscription(&self) -> Subscription<Message> {
        tick_subscription()
    }

    /// Render the view.
    pub fn view(&self) -> Element<'_, Message> {
        match self.screen {
            Screen::Overview => overview_view(
                &self.overview,
                &self.routes,
                self.last_route.as_deref(),
                &self.notifications,
            ),
            Screen::Route => route_view(&self.route, &self.notifications),
        }
    }

    /// Get the application theme.
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn pane_mut(&mut self, screen: Screen) -> &mut GraphPane<CanvasEngine> {
        match screen {
            Screen::Overview => self.overview.pane_mut(),
            Screen::Route => self.route.pane_mut(),
        }
    }

    /// Point both panes' listener slots at the outbox.
    fn install_listeners(&mut self) {
        for screen in [Screen::Overview, Screen::Route] {
            let outbox = self.outbox.clone();
            self.pane_mut(screen)
                .on_select()
                .set(move |payload| outbox.borrow_mut().push(Message::Selected { screen, payload }));
        }

        // Only overview edges navigate; route edges never carry a route id.
        let outbox = self.outbox.clone();
        self.overview
            .pane()
            .on_open_route()
            .set(move |route_id| outbox.borrow_mut().push(Message::OpenRoute(route_id)));
    }

    fn load_overview(&mut self) -> Task<Message> {
        let generation = self.overview.begin_load();
        Task::perform(backend::fetch_overview(self.backend.clone()), move |result| {
            Message::OverviewLoaded { generation, result }
        })
    }

    fn load_routes(&mut self) -> Task<Message> {
        self.routes.begin_load();
        Task::perform(
            backend::fetch_routes(self.backend.clone()),
            Message::RoutesLoaded,
        )
    }

    fn open_route(&mut self, route_id: String) -> Task<Message> {
        self.screen = Screen::Route;
        self.last_route = Some(route_id.clone());

        if self.route.shows(&route_id) {
            tracing::debug!(route = %route_id, "Route already loaded");
            return Task::none();
        }

        let generation = self.route.open(route_id.clone());
        self.fetch_route(generation, route_id)
    }

    fn fetch_route(&self, generation: u64, route_id: String) -> Task<Message> {
        let backend = self.backend.clone();
        Task::perform(
            backend::fetch_route(backend, route_id.clone()),
            move |fetch| Message::RouteLoaded {
                generation,
                route_id,
                fetch,
            },
        )
    }

    /// Send a captured batch to the backend.
    fn save(&self, screen: Screen, batch: Option<PositionBatch>) -> Task<Message> {
        let Some(batch) = batch else {
            return Task::none();
        };
        tracing::debug!(
            batch = batch.id,
            origin = ?batch.origin,
            nodes = batch.len(),
            "Saving positions"
        );

        let id = batch.id;
        Task::perform(
            backend::save_positions(self.backend.clone(), batch.updates),
            move |result| Message::PositionsSaved {
                screen,
                batch: id,
                result,
            },
        )
    }

    fn handle_saved(&mut self, screen: Screen, batch: u64, result: Result<usize, String>) {
        match self.pane_mut(screen).complete_save(batch, result) {
            SaveOutcome::Saved { count, relocked } => {
                tracing::info!(batch, count, relocked = relocked.len(), "Positions saved");
                self.notifications
                    .info(format!("Saved {} node positions", count));
            }
            SaveOutcome::Failed { error, unsaved } => {
                tracing::warn!(
                    batch,
                    error = %error,
                    unsaved = unsaved.len(),
                    "Failed to save positions"
                );
                self.notifications.error(format!(
                    "Could not save positions ({} nodes left unsaved): {}",
                    unsaved.len(),
                    error
                ));
            }
            SaveOutcome::Stale => {
                tracing::debug!(batch, "Ignoring save result for a reset view");
            }
        }
    }
}
