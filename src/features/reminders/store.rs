//! # Event Store
//!
//! Thread-safe container for the full event set and the due-queue. A single
//! async mutex guards both collections. Waking the scheduler is a separate
//! primitive ([`tokio::sync::Notify`]) so data protection and wakeups stay
//! independent.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::debug;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{Mutex, Notify};

use crate::core::{now_secs, Event, RecordId};

/// Due-queue key: due time first, then insertion sequence for stable ties
type DueKey = (i64, u64);

#[derive(Default)]
struct StoreInner {
    all: HashMap<RecordId, Event>,
    due: BTreeMap<DueKey, Event>,
    next_seq: u64,
}

impl StoreInner {
    fn remove_due(&mut self, id: RecordId) -> bool {
        let before = self.due.len();
        self.due.retain(|_, event| event.id != id);
        self.due.len() != before
    }

    fn earliest(&self) -> Option<i64> {
        self.due.keys().next().map(|(due_at, _)| *due_at)
    }
}

#[derive(Default)]
pub struct EventStore {
    inner: Mutex<StoreInner>,
    changed: Notify,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an event in the full set
    pub async fn upsert_full(&self, event: Event) {
        let mut inner = self.inner.lock().await;
        inner.all.insert(event.id, event);
    }

    /// Schedule an event if it is still in the future
    pub async fn insert_due(&self, event: Event) -> bool {
        self.insert_due_at(event, now_secs()).await
    }

    /// Schedule an event if `event.due_at > now`. Returns whether it was queued.
    pub async fn insert_due_at(&self, event: Event, now: i64) -> bool {
        if !event.is_due_after(now) {
            debug!("Not scheduling {} ({}): due time has passed", event.id, event.display_name);
            return false;
        }

        {
            let mut inner = self.inner.lock().await;
            inner.remove_due(event.id);
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.due.insert((event.due_at, seq), event);
        }

        self.signal();
        true
    }

    /// Remove from both the full set and the due-queue
    pub async fn remove_by_id(&self, id: RecordId) -> bool {
        let (from_all, from_due) = {
            let mut inner = self.inner.lock().await;
            let from_all = inner.all.remove(&id).is_some();
            let from_due = inner.remove_due(id);
            (from_all, from_due)
        };

        if from_due {
            self.signal();
        }
        from_all || from_due
    }

    pub async fn find_by_id(&self, id: RecordId) -> Option<Event> {
        self.inner.lock().await.all.get(&id).cloned()
    }

    /// Atomically take every queued event with `due_at <= now`, earliest first
    pub async fn pop_due_before(&self, now: i64) -> Vec<Event> {
        let mut inner = self.inner.lock().await;
        let pending = inner.due.split_off(&(now.saturating_add(1), 0));
        let ready = std::mem::replace(&mut inner.due, pending);
        ready.into_values().collect()
    }

    /// Earliest queued due time
    pub async fn peek_earliest(&self) -> Option<i64> {
        self.inner.lock().await.earliest()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.all.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn due_len(&self) -> usize {
        self.inner.lock().await.due.len()
    }

    /// Whether `id` is currently queued
    pub async fn is_scheduled(&self, id: RecordId) -> bool {
        self.inner
            .lock()
            .await
            .due
            .values()
            .any(|event| event.id == id)
    }

    /// Drop every event
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.all.clear();
        inner.due.clear();
    }

    /// Wake the scheduler. A wakeup with no waiter is kept for the next wait.
    pub fn signal(&self) {
        self.changed.notify_one();
    }

    /// Resolve at the next [`EventStore::signal`]
    pub async fn changed(&self) {
        self.changed.notified().await;
    }
}
