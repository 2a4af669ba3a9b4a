//! # Event Model
//!
//! The reminder record as the scheduler sees it, plus the raw attribute
//! bundle read from storage.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a backing record.
///
/// Survives renames; used to join storage notifications with in-memory events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The three attributes carried by every record.
///
/// Missing attributes deserialize to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFields {
    /// Absolute due time, seconds since the epoch
    pub when: i64,
    /// Where the event takes place
    #[serde(rename = "where")]
    pub location: String,
    /// What the event is
    #[serde(rename = "what")]
    pub description: String,
}

impl RecordFields {
    pub fn new(when: i64, location: impl Into<String>, description: impl Into<String>) -> Self {
        RecordFields {
            when,
            location: location.into(),
            description: description.into(),
        }
    }
}

/// One reminder, owned by the event store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: RecordId,
    /// Current file name of the backing record
    pub display_name: String,
    /// Seconds since the epoch
    pub due_at: i64,
    pub location: String,
    pub description: String,
}

impl Event {
    /// Build an event from a record's identity and freshly read attributes
    pub fn from_record(id: RecordId, display_name: impl Into<String>, fields: RecordFields) -> Self {
        Event {
            id,
            display_name: display_name.into(),
            due_at: fields.when,
            location: fields.location,
            description: fields.description,
        }
    }

    /// Whether the event still lies in the future relative to `now` (epoch seconds)
    pub fn is_due_after(&self, now: i64) -> bool {
        self.due_at > now
    }

    /// Due time rendered for logs, or `None` for an unset timestamp
    pub fn due_display(&self) -> Option<String> {
        if self.due_at == 0 {
            return None;
        }
        DateTime::<Utc>::from_timestamp(self.due_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }
}

/// Current wall-clock time in epoch seconds
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
