//! Details side panel for the selected node or edge.

use iced::widget::{button, column, container, row, rule, scrollable, text};
use iced::{Alignment, Color, Element, Length};
use serde_json::Value;

use crate::graph::{Selected, SelectionPayload, route_id};
use crate::message::{GraphMessage, Message};

/// Render the panel. `None` shows the empty state.
pub fn details_panel(
    payload: Option<&SelectionPayload>,
    wrap: fn(GraphMessage) -> Message,
) -> Element<'_, Message> {
    let Some(payload) = payload else {
        return container(text("Click a node or edge to see its details").size(12))
            .padding(15)
            .width(Length::Fixed(260.0))
            .style(container::rounded_box)
            .into();
    };

    let mut items = column![].spacing(6);

    match &payload.selected {
        Selected::Node(node) => {
            let title = if node.label.is_empty() {
                &node.id
            } else {
                &node.label
            };
            items = items
                .push(text(title).size(16))
                .push(text(node.kind.to_string()).size(10))
                .push(rule::horizontal(1))
                .push(field("ID", &node.id));
            if let Some(layer) = &node.layer {
                items = items.push(field("Layer", layer));
            }
            if let Some(status) = &node.status {
                items = items.push(field("Status", status));
            }
            items = items.push(meta_section(&node.meta));
        }
        Selected::Edge(edge) => {
            let title = if edge.title.is_empty() {
                &edge.id
            } else {
                &edge.title
            };
            items = items
                .push(text(title).size(16))
                .push(text(edge.kind.to_string()).size(10))
                .push(rule::horizontal(1))
                .push(field("ID", &edge.id))
                .push(field("From", &edge.from))
                .push(field("To", &edge.to));
            items = items.push(meta_section(&edge.meta));

            if let Some(route) = route_id(&edge.meta) {
                items = items.push(
                    button(text(format!("Open route {}", route)).size(11))
                        .on_press(Message::OpenRoute(route))
                        .style(iced::widget::button::primary)
                        .width(Length::Fill),
                );
            }
        }
    }

    if let Some(pin) = &payload.pinned {
        let what = match pin.kind {
            crate::graph::PinKind::Node => "node",
            crate::graph::PinKind::Edge => "edge",
        };
        items = items.push(rule::horizontal(1)).push(
            text(format!("Pinned {} {}", what, pin.id))
                .size(11)
                .color(Color::from_rgb(1.0, 0.23, 0.19)),
        );
    }

    items = items.push(rule::horizontal(1)).push(
        button(text("Clear Selection").size(11))
            .on_press(wrap(GraphMessage::ClearSelection))
            .style(iced::widget::button::secondary)
            .width(Length::Fill),
    );

    container(scrollable(items))
        .padding(15)
        .width(Length::Fixed(260.0))
        .style(container::rounded_box)
        .into()
}

fn field<'a>(name: &'a str, value: &'a str) -> Element<'a, Message> {
    row![text(format!("{}:", name)).size(11), text(value).size(11)]
        .spacing(6)
        .align_y(Alignment::Center)
        .into()
}

fn meta_section(meta: &plantview_common::Meta) -> Element<'_, Message> {
    if meta.is_empty() {
        return column![].into();
    }

    let mut section = column![text("Attributes").size(12)].spacing(3);
    for (key, value) in meta {
        section = section.push(text(format!("{}: {}", key, format_value(value))).size(11));
    }
    section.into()
}

/// Render a meta value on one line.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
