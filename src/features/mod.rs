//! # Features Layer
//!
//! - **reminders**: event store, change listener and scheduler
//! - **notifications**: sinks presenting due reminders to the user

pub mod notifications;
pub mod reminders;

pub use notifications::{Decision, LogSink, NotificationSink};
#[cfg(feature = "prompt")]
pub use notifications::PromptSink;
pub use reminders::{ChangeListener, EventStore, ReminderScheduler, RememberService, SchedulerHandle};
