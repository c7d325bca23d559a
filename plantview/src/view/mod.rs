//! View components for the PlantView application.

pub mod canvas;
pub mod details;
pub mod notifications;
pub mod overview;
pub mod route;
pub mod route_list;

use iced::widget::{Row, button, row, text};
use iced::{Alignment, Element};

use crate::graph::GraphPane;
use crate::message::{GraphMessage, Message};
use canvas::CanvasEngine;

/// Toolbar buttons shared by both graph screens.
pub fn pane_controls<'a>(
    pane: &GraphPane<CanvasEngine>,
    wrap: fn(GraphMessage) -> Message,
) -> Row<'a, Message> {
    let lock_label = if pane.is_drag_locked() {
        "Unlock Drag"
    } else {
        "Lock Drag"
    };

    row![
        toolbar_button("Reload", wrap(GraphMessage::Reload)),
        toolbar_button("Fit", wrap(GraphMessage::Fit)),
        toolbar_button("+", wrap(GraphMessage::ZoomIn)),
        toolbar_button("-", wrap(GraphMessage::ZoomOut)),
        toolbar_button("1:1", wrap(GraphMessage::ZoomReset)),
        toolbar_button(lock_label, wrap(GraphMessage::ToggleDragLock)),
    ]
    .spacing(6)
    .align_y(Alignment::Center)
}

/// A small secondary button.
pub fn toolbar_button<'a>(label: &'a str, message: Message) -> Element<'a, Message> {
    button(text(label).size(12))
        .on_press(message)
        .style(iced::widget::button::secondary)
        .into()
}
