//! # In-Memory Record Store
//!
//! A record store living entirely in process memory. Every mutation emits
//! the same notifications a watched directory would, synchronously, which
//! makes it the backend of choice for tests and for embedding the scheduler
//! in another application.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use dashmap::{DashMap, DashSet};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::{RecordHandle, RecordStore, StorageNotification};
use crate::core::{RecordFields, RecordId};

pub struct MemoryRecordStore {
    scope: PathBuf,
    available: bool,
    records: DashMap<String, (RecordId, RecordFields)>,
    next_id: AtomicU64,
    watched: DashSet<RecordId>,
    subscriber: Mutex<Option<mpsc::UnboundedSender<StorageNotification>>>,
}

impl MemoryRecordStore {
    pub fn new(scope: impl Into<PathBuf>) -> Self {
        MemoryRecordStore {
            scope: scope.into(),
            available: true,
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
            watched: DashSet::new(),
            subscriber: Mutex::new(None),
        }
    }

    /// A store whose location does not exist
    pub fn unavailable(scope: impl Into<PathBuf>) -> Self {
        MemoryRecordStore {
            available: false,
            ..Self::new(scope)
        }
    }

    /// Seed a record with a fixed id without emitting a notification
    pub fn insert_record(&self, id: RecordId, name: &str, fields: RecordFields) {
        self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
        self.records.insert(name.to_string(), (id, fields));
    }

    /// Rename a record inside the watched location
    pub fn rename_record(&self, from: &str, to: &str) -> Result<RecordId> {
        let (_, (id, fields)) = self
            .records
            .remove(from)
            .ok_or_else(|| anyhow::anyhow!("No record named '{}'", from))?;
        self.records.insert(to.to_string(), (id, fields));
        self.emit(StorageNotification::Renamed {
            id,
            new_scope: Some(self.scope.clone()),
            new_name: to.to_string(),
        });
        Ok(id)
    }

    /// Move a record out of the watched location. `new_scope` is `None` when
    /// the destination is not known.
    pub fn move_out(&self, name: &str, new_scope: Option<PathBuf>) -> Result<RecordId> {
        let (_, (id, _)) = self
            .records
            .remove(name)
            .ok_or_else(|| anyhow::anyhow!("No record named '{}'", name))?;
        self.emit(StorageNotification::Renamed {
            id,
            new_scope,
            new_name: name.to_string(),
        });
        Ok(id)
    }

    /// Move a record from elsewhere into the watched location
    pub fn move_in(&self, id: RecordId, name: &str, fields: RecordFields) {
        self.insert_record(id, name, fields);
        self.emit(StorageNotification::Renamed {
            id,
            new_scope: Some(self.scope.clone()),
            new_name: name.to_string(),
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn is_watching(&self, id: RecordId) -> bool {
        self.watched.contains(&id)
    }

    fn emit(&self, notification: StorageNotification) {
        let guard = match self.subscriber.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(tx) = guard.as_ref() {
            if tx.send(notification).is_err() {
                debug!("Notification dropped: subscriber gone");
            }
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn scope(&self) -> &Path {
        &self.scope
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn enumerate(&self) -> Result<Vec<RecordHandle>> {
        if !self.available {
            return Err(anyhow::anyhow!(
                "Events directory not found ({})",
                self.scope.display()
            ));
        }
        let mut handles: Vec<RecordHandle> = self
            .records
            .iter()
            .map(|entry| RecordHandle {
                id: entry.value().0,
                name: entry.key().clone(),
            })
            .collect();
        handles.sort_by_key(|h| h.id);
        Ok(handles)
    }

    fn read_record(&self, name: &str) -> Result<(RecordId, RecordFields)> {
        self.records
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| anyhow::anyhow!("No record named '{}'", name))
    }

    fn write_record(&self, name: &str, fields: &RecordFields) -> Result<RecordId> {
        let existing = self.records.get(name).map(|entry| entry.value().0);
        match existing {
            Some(id) => {
                self.records.insert(name.to_string(), (id, fields.clone()));
                if self.watched.contains(&id) {
                    self.emit(StorageNotification::AttributeChanged { id });
                }
                Ok(id)
            }
            None => {
                let id = RecordId(self.next_id.fetch_add(1, Ordering::SeqCst));
                self.records.insert(name.to_string(), (id, fields.clone()));
                self.emit(StorageNotification::Created {
                    id,
                    scope: self.scope.clone(),
                    name: name.to_string(),
                });
                Ok(id)
            }
        }
    }

    fn remove_record(&self, name: &str) -> Result<()> {
        let (_, (id, _)) = self
            .records
            .remove(name)
            .ok_or_else(|| anyhow::anyhow!("No record named '{}'", name))?;
        self.emit(StorageNotification::Removed { id });
        Ok(())
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<StorageNotification>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut guard = match self.subscriber.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(tx);
        Ok(rx)
    }

    fn watch_record(&self, id: RecordId) {
        self.watched.insert(id);
    }

    fn unwatch_record(&self, id: RecordId) {
        self.watched.remove(&id);
    }

    fn stop_watching(&self) {
        let mut guard = match self.subscriber.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
        self.watched.clear();
    }
}
