//! # Reminders Feature
//!
//! Time-ordered reminder delivery backed by a watched record store.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Event store, change listener and wakeable scheduler over a watched events directory
//! - 1.0.0: Initial scheduled reminder system

pub mod listener;
pub mod scheduler;
pub mod service;
pub mod store;

pub use listener::ChangeListener;
pub use scheduler::{ReminderScheduler, SchedulerHandle};
pub use service::RememberService;
pub use store::EventStore;
