use std::time::Duration;

use iced::Subscription;

use crate::message::Message;

/// Interval between notification expiry checks.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Create a tick subscription for periodic UI updates.
pub fn tick_subscription() -> Subscription<Message> {
    iced::time::every(TICK_INTERVAL).map(|_| Message::Tick)
}
