//! # Notification Sink
//!
//! The user-facing end of the scheduler: presents one due event and returns
//! whether its backing record should be deleted or kept.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::info;

/// What to do with a record once its notification has been shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Delete,
    Keep,
}

/// Presents due events to the user.
///
/// `present` may block for as long as the user takes to answer; the
/// scheduler calls it from a blocking thread with no store lock held.
pub trait NotificationSink: Send + Sync {
    fn present(&self, location: &str, description: &str) -> Decision;
}

/// Alert body shown for a due event
pub fn format_notification(location: &str, description: &str) -> String {
    format!(
        "Event Notification\n------------------\nWhere:\t{}\nWhat:\t\t{}",
        location, description
    )
}

/// Headless sink: logs every event and keeps its record
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn present(&self, location: &str, description: &str) -> Decision {
        info!("⏰ Reminder due - where: {location}, what: {description}");
        Decision::Keep
    }
}
