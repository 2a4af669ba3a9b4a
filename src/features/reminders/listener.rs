//! # Change Listener
//!
//! Bridges record store notifications into event store mutations. Startup
//! enumeration and live notifications share one insertion path, so a record
//! seen twice (enumerated and then reported as created) simply replaces
//! itself by id.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::{Event, RecordId};
use crate::features::reminders::store::EventStore;
use crate::storage::{RecordStore, StorageNotification};

pub struct ChangeListener {
    store: Arc<EventStore>,
    records: Arc<dyn RecordStore>,
}

impl ChangeListener {
    pub fn new(store: Arc<EventStore>, records: Arc<dyn RecordStore>) -> Self {
        ChangeListener { store, records }
    }

    /// Load every existing record once. A missing events directory is logged
    /// and leaves the set empty.
    pub async fn enumerate(&self) -> usize {
        let handles = match self.records.enumerate() {
            Ok(handles) => handles,
            Err(e) => {
                warn!("📂 {e:#}; starting with no events");
                return 0;
            }
        };

        let mut loaded = 0;
        for handle in handles {
            if self.add_record(&handle.name, true).await.is_some() {
                loaded += 1;
            }
        }

        info!(
            "📂 Loaded {} event(s) from {} ({} scheduled)",
            loaded,
            self.records.scope().display(),
            self.store.due_len().await
        );
        loaded
    }

    /// Consume notifications until the stream closes
    pub async fn run(self, mut notifications: mpsc::UnboundedReceiver<StorageNotification>) {
        while let Some(notification) = notifications.recv().await {
            self.handle(notification).await;
        }
        debug!("Record notification stream closed, listener exiting");
    }

    /// Route one notification to its handler
    pub async fn handle(&self, notification: StorageNotification) {
        debug!("Record notification: {notification:?}");
        match notification {
            StorageNotification::Created { id, scope, name } => {
                if scope.as_path() != self.records.scope() {
                    debug!("Ignoring {id} created outside the events directory");
                    return;
                }
                self.on_created(id, &name).await;
            }
            StorageNotification::Removed { id } => self.on_removed(id).await,
            StorageNotification::Renamed {
                id,
                new_scope,
                new_name,
            } => {
                let into_scope = new_scope.as_deref() == Some(self.records.scope());
                if into_scope {
                    self.on_renamed_into(id, &new_name).await;
                } else {
                    self.on_renamed_away(id).await;
                }
            }
            StorageNotification::AttributeChanged { id } => self.on_attribute_changed(id).await,
        }
    }

    async fn on_created(&self, id: RecordId, name: &str) {
        match self.add_record(name, true).await {
            Some(added) if added != id => {
                debug!("Record '{name}' reported as {id} but now resolves to {added}");
            }
            Some(_) => info!("➕ Event '{name}' added"),
            None => {}
        }
    }

    async fn on_removed(&self, id: RecordId) {
        if self.store.remove_by_id(id).await {
            info!("➖ Event {id} removed");
        }
        self.records.unwatch_record(id);
    }

    async fn on_renamed_away(&self, id: RecordId) {
        if self.store.remove_by_id(id).await {
            info!("➖ Event {id} moved out of the events directory");
        }
        self.records.unwatch_record(id);
    }

    async fn on_renamed_into(&self, id: RecordId, name: &str) {
        // A rename within the directory refreshes the event under its new name
        self.store.remove_by_id(id).await;
        if self.add_record(name, true).await.is_some() {
            info!("↪️ Event '{name}' moved into the events directory");
        }
    }

    async fn on_attribute_changed(&self, id: RecordId) {
        let Some(previous) = self.store.find_by_id(id).await else {
            debug!("Attribute change for unknown event {id}");
            return;
        };

        self.store.remove_by_id(id).await;
        if self.add_record(&previous.display_name, false).await.is_some() {
            info!("✏️ Event '{}' updated", previous.display_name);
        }
    }

    /// Read a record and insert it into the full set, and into the due-queue
    /// when it lies in the future. Returns the record id on success.
    async fn add_record(&self, name: &str, watch: bool) -> Option<RecordId> {
        let (id, fields) = match self.records.read_record(name) {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to read event record '{name}': {e:#}");
                return None;
            }
        };

        let event = Event::from_record(id, name, fields);
        if watch {
            self.records.watch_record(id);
        }

        self.store.upsert_full(event.clone()).await;
        if self.store.insert_due(event.clone()).await {
            debug!(
                "Scheduled '{}' for {}",
                name,
                event.due_display().unwrap_or_default()
            );
        }
        Some(id)
    }
}
