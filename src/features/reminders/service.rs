//! # Reminder Service
//!
//! Owns everything the daemon runs: the shared event store, the change
//! listener task and the scheduler task. Constructed once at startup and torn
//! down with [`RememberService::shutdown`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::features::notifications::NotificationSink;
use crate::features::reminders::listener::ChangeListener;
use crate::features::reminders::scheduler::{ReminderScheduler, SchedulerHandle};
use crate::features::reminders::store::EventStore;
use crate::storage::RecordStore;

pub struct RememberService {
    store: Arc<EventStore>,
    records: Arc<dyn RecordStore>,
    listener: Option<JoinHandle<()>>,
    scheduler: SchedulerHandle,
}

impl RememberService {
    /// Load existing records and start the listener and scheduler tasks.
    ///
    /// Notifications are subscribed to before enumeration so nothing created
    /// in between is missed; records reported twice are deduplicated by id.
    pub async fn start(
        records: Arc<dyn RecordStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let store = Arc::new(EventStore::new());
        let listener = ChangeListener::new(store.clone(), records.clone());

        let notifications = if records.is_available() {
            match records.subscribe() {
                Ok(rx) => Some(rx),
                Err(e) => {
                    error!(
                        "Failed to watch {}: {e:#}. Changes will not be picked up.",
                        records.scope().display()
                    );
                    None
                }
            }
        } else {
            warn!(
                "📂 Events directory not found ({})",
                records.scope().display()
            );
            None
        };

        listener.enumerate().await;

        let listener_task = notifications.map(|rx| tokio::spawn(listener.run(rx)));
        let scheduler = ReminderScheduler::new(store.clone(), records.clone(), sink).spawn();

        info!("✅ Remember service running");
        Ok(RememberService {
            store,
            records,
            listener: listener_task,
            scheduler,
        })
    }

    /// Shared event store
    pub fn store(&self) -> Arc<EventStore> {
        self.store.clone()
    }

    /// Whether live change notifications are being processed
    pub fn is_watching(&self) -> bool {
        self.listener
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Stop watching, stop the scheduler, then release every event
    pub async fn shutdown(self) {
        info!("Shutting down Remember service...");

        self.records.stop_watching();
        if let Some(task) = self.listener {
            if let Err(e) = task.await {
                error!("Change listener task failed: {e}");
            }
        }

        self.scheduler.stop().await;
        self.store.clear().await;

        info!("👋 Remember service stopped");
    }
}
