//! # Notifications Feature
//!
//! Sinks that present due reminders to the user.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

#[cfg(feature = "prompt")]
pub mod prompt;
pub mod sink;

#[cfg(feature = "prompt")]
pub use prompt::PromptSink;
pub use sink::{format_notification, Decision, LogSink, NotificationSink};
