//! Sidebar list of logical routes.

use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Alignment, Element, Length};

use plantview_common::RouteSummary;

use crate::message::Message;

/// Route list contents.
#[derive(Debug, Clone, Default)]
pub struct RouteListState {
    pub routes: Vec<RouteSummary>,
    pub loading: bool,
    pub error: Option<String>,
}

impl RouteListState {
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    pub fn finish_load(&mut self, result: Result<Vec<RouteSummary>, String>) {
        self.loading = false;
        match result {
            Ok(routes) => {
                tracing::info!(routes = routes.len(), "Route list loaded");
                self.routes = routes;
                self.error = None;
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to load route list");
                self.error = Some(error);
            }
        }
    }
}

/// Render the route list. `current` is highlighted.
pub fn route_list_view<'a>(state: &'a RouteListState, current: Option<&str>) -> Element<'a, Message> {
    let header = row![
        text("Routes").size(16),
        button(text("Reload").size(11))
            .on_press(Message::ReloadRoutes)
            .style(iced::widget::button::secondary),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mut list = column![header].spacing(6);

    if let Some(error) = &state.error {
        list = list.push(text(format!("Error: {}", error)).size(11));
    }
    if state.loading {
        list = list.push(text("Loading routes...").size(11));
    } else if state.routes.is_empty() {
        list = list.push(text("No routes").size(11));
    }

    for route in &state.routes {
        let id = route.id.as_deref().unwrap_or("?");
        let ends = format!(
            "{} -> {}",
            route.from_odf_id.as_deref().unwrap_or("?"),
            route.to_odf_id.as_deref().unwrap_or("?")
        );
        let entry = column![
            text(id).size(13),
            text(ends).size(10),
            text(route.summary_text()).size(10),
        ]
        .spacing(2);

        let style = if route.id.is_some() && route.id.as_deref() == current {
            iced::widget::button::primary
        } else {
            iced::widget::button::secondary
        };
        list = list.push(
            button(entry)
                .on_press_maybe(route.id.clone().map(Message::OpenRoute))
                .style(style)
                .width(Length::Fill),
        );
    }

    container(scrollable(list))
        .padding(15)
        .width(Length::Fixed(240.0))
        .style(container::rounded_box)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_reload_keeps_routes() {
        let mut state = RouteListState::default();
        state.begin_load();
        state.finish_load(Ok(crate::mock::routes()));
        assert_eq!(state.routes.len(), 2);

        state.finish_load(Err("timeout".into()));
        assert_eq!(state.routes.len(), 2);
        assert_eq!(state.error.as_deref(), Some("timeout"));
        assert!(!state.loading);
    }
}
