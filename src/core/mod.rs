//! # Core Module
//!
//! Core domain types and configuration for the reminder daemon.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod config;
pub mod event;

// Re-export commonly used items
pub use config::{Config, SinkKind};
pub use event::{now_millis, now_secs, Event, RecordFields, RecordId};
