//! Transient, non-blocking notifications.

use std::time::{Duration, Instant};

use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Color, Element, Length};

use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub text: String,
    created: Instant,
}

/// Notifications currently on screen.
#[derive(Debug, Clone)]
pub struct Notifications {
    items: Vec<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            ttl,
        }
    }

    pub fn info(&mut self, text: impl Into<String>) -> u64 {
        self.push(Level::Info, text.into(), Instant::now())
    }

    pub fn error(&mut self, text: impl Into<String>) -> u64 {
        self.push(Level::Error, text.into(), Instant::now())
    }

    fn push(&mut self, level: Level, text: String, created: Instant) -> u64 {
        self.next_id += 1;
        self.items.push(Notification {
            id: self.next_id,
            level,
            text,
            created,
        });
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|n| n.id != id);
    }

    /// Drop notifications older than the time-to-live.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|n| now.saturating_duration_since(n.created) < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Render the notification strip.
pub fn notifications_view(notifications: &Notifications) -> Element<'_, Message> {
    let mut strip = column![].spacing(4);

    for notification in notifications.iter() {
        let color = match notification.level {
            Level::Info => Color::from_rgb(0.5, 0.8, 0.5),
            Level::Error => Color::from_rgb(0.95, 0.35, 0.35),
        };
        strip = strip.push(
            container(
                row![
                    text(&notification.text).size(12).color(color).width(Length::Fill),
                    button(text("x").size(11))
                        .on_press(Message::DismissNotification(notification.id))
                        .style(iced::widget::button::text),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
            )
            .padding(6)
            .style(container::rounded_box),
        );
    }

    strip.into()
}
