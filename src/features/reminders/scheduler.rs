//! # Reminder Scheduler
//!
//! Background task that sleeps until the earliest queued event is due, or
//! until the event store signals a change, then delivers every due event in
//! time order.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Lifecycle
//! `Idle` pops whatever is due and moves to `Draining` if anything was. From
//! `Idle` the task waits, indefinitely when the queue is empty or until the
//! earliest deadline otherwise. Any store signal cuts the wait short and the
//! loop recomputes from scratch. [`SchedulerHandle::stop`] moves it to
//! `Stopped` and fires the same signal so a blocked wait returns promptly.

use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::{now_millis, Event};
use crate::features::notifications::{Decision, NotificationSink};
use crate::features::reminders::store::EventStore;
use crate::storage::RecordStore;

/// Milliseconds from `now_ms` until `due_at` (epoch seconds), clamped at zero
fn wait_duration(due_at: i64, now_ms: i64) -> Duration {
    let due_ms = due_at.saturating_mul(1000);
    let remaining = due_ms.saturating_sub(now_ms).max(0);
    Duration::from_millis(remaining as u64)
}

pub struct ReminderScheduler {
    store: Arc<EventStore>,
    records: Arc<dyn RecordStore>,
    sink: Arc<dyn NotificationSink>,
    stopping: Arc<AtomicBool>,
}

/// Controls a running scheduler task
pub struct SchedulerHandle {
    store: Arc<EventStore>,
    stopping: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Request shutdown and wait for the task to exit
    pub async fn stop(self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.store.signal();
        if let Err(e) = self.task.await {
            error!("Reminder scheduler task failed: {e}");
        }
    }
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<EventStore>,
        records: Arc<dyn RecordStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        ReminderScheduler {
            store,
            records,
            sink,
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the scheduler loop on the current runtime
    pub fn spawn(self) -> SchedulerHandle {
        let store = self.store.clone();
        let stopping = self.stopping.clone();
        let task = tokio::spawn(self.run());
        SchedulerHandle {
            store,
            stopping,
            task,
        }
    }

    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Run until stopped
    pub async fn run(self) {
        info!("⏰ Reminder scheduler started");

        while !self.is_stopping() {
            let now_ms = now_millis();
            let due = self.store.pop_due_before(now_ms.div_euclid(1000)).await;

            if !due.is_empty() {
                debug!("Delivering {} due event(s)", due.len());
                for event in due {
                    if self.is_stopping() {
                        break;
                    }
                    self.deliver(event).await;
                }
                continue;
            }

            match self.store.peek_earliest().await {
                None => {
                    debug!("No scheduled events, waiting for changes");
                    self.store.changed().await;
                }
                Some(due_at) => {
                    let wait = wait_duration(due_at, now_millis());
                    debug!("Next event due in {wait:?}");
                    tokio::select! {
                        _ = self.store.changed() => {}
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }

        info!("Reminder scheduler stopped");
    }

    /// Present one event and act on the user's decision
    async fn deliver(&self, event: Event) {
        info!("🔔 Event '{}' is due", event.display_name);

        let sink = self.sink.clone();
        let location = event.location.clone();
        let description = event.description.clone();
        let decision =
            tokio::task::spawn_blocking(move || sink.present(&location, &description)).await;

        match decision {
            Ok(Decision::Delete) => {
                // The record may have been renamed or removed while the prompt was open
                let Some(current) = self.store.find_by_id(event.id).await else {
                    debug!("Event {} already gone, nothing to delete", event.id);
                    return;
                };
                // The removal notification reconciles the event store
                if let Err(e) = self.records.remove_record(&current.display_name) {
                    warn!(
                        "Could not delete event record '{}': {e:#}",
                        current.display_name
                    );
                } else {
                    info!("🗑️ Deleted event record '{}'", current.display_name);
                }
            }
            Ok(Decision::Keep) => debug!("Keeping event record '{}'", event.display_name),
            Err(e) => error!(
                "Notification for '{}' failed: {e}",
                event.display_name
            ),
        }
    }
}
