// Core layer - shared types and configuration
pub mod core;

// Storage layer - record store contract and backends
pub mod storage;

// Features layer - scheduler and notification sinks
pub mod features;

pub use crate::core::{Config, Event, RecordFields, RecordId, SinkKind};

pub use features::{
    // Notifications
    Decision, LogSink, NotificationSink,
    // Reminders
    ChangeListener, EventStore, ReminderScheduler, RememberService, SchedulerHandle,
};
#[cfg(feature = "prompt")]
pub use features::PromptSink;

pub use storage::{FsRecordStore, MemoryRecordStore, RecordStore, StorageNotification};
