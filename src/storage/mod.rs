//! # Storage Module
//!
//! The record store contract the reminder scheduler is built against, and
//! its backends. A record is one named entry in a watched location carrying
//! `when`/`where`/`what` attributes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod fs;
pub mod memory;

pub use fs::FsRecordStore;
pub use memory::MemoryRecordStore;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::core::{RecordFields, RecordId};

/// A record as seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHandle {
    pub id: RecordId,
    pub name: String,
}

/// Change notifications emitted by a record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageNotification {
    /// A record appeared in `scope` under `name`
    Created {
        id: RecordId,
        scope: PathBuf,
        name: String,
    },
    /// A record was deleted
    Removed { id: RecordId },
    /// A record was renamed or moved. `new_scope` is `None` when it left the
    /// watched location.
    Renamed {
        id: RecordId,
        new_scope: Option<PathBuf>,
        new_name: String,
    },
    /// Attributes of a watched record changed
    AttributeChanged { id: RecordId },
}

/// Key/value record store with change notifications.
///
/// Directory-scope notifications (created, removed, renamed) flow through the
/// receiver returned by [`RecordStore::subscribe`]. Attribute changes are
/// only reported for records registered with [`RecordStore::watch_record`].
pub trait RecordStore: Send + Sync {
    /// The watched location
    fn scope(&self) -> &Path;

    /// Whether the watched location exists and can be enumerated
    fn is_available(&self) -> bool;

    /// List every record currently present
    fn enumerate(&self) -> Result<Vec<RecordHandle>>;

    /// Read a record's identity and attributes. Missing or malformed
    /// attributes come back as their zero value.
    fn read_record(&self, name: &str) -> Result<(RecordId, RecordFields)>;

    /// Create or overwrite a record
    fn write_record(&self, name: &str, fields: &RecordFields) -> Result<RecordId>;

    /// Delete a record
    fn remove_record(&self, name: &str) -> Result<()>;

    /// Start directory-scope notifications
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<StorageNotification>>;

    /// Report attribute changes for `id`
    fn watch_record(&self, id: RecordId);

    /// Stop reporting attribute changes for `id`
    fn unwatch_record(&self, id: RecordId);

    /// Drop every subscription; the notification stream closes
    fn stop_watching(&self);
}
