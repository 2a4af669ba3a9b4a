//! # Directory Record Store
//!
//! Each regular file in the events directory is one record. The file's
//! inode number is its stable id and its body holds the `when`, `where` and
//! `what` attributes as a YAML mapping. Change notifications come from the
//! platform watcher (`notify`), non-recursive, and are translated into
//! [`StorageNotification`]s.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Context, Result};
use dashmap::{DashMap, DashSet};
use log::{debug, error, info, warn};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::{RecordHandle, RecordStore, StorageNotification};
use crate::core::{RecordFields, RecordId};

pub struct FsRecordStore {
    dir: PathBuf,
    /// File name -> record id, kept so removals resolve after the file is gone
    index: Arc<DashMap<String, RecordId>>,
    watched: Arc<DashSet<RecordId>>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FsRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsRecordStore {
            dir: dir.into(),
            index: Arc::new(DashMap::new()),
            watched: Arc::new(DashSet::new()),
            watcher: Mutex::new(None),
        }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn lock_watcher(&self) -> std::sync::MutexGuard<'_, Option<RecommendedWatcher>> {
        match self.watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Whether a file name denotes a record (hidden, temporary and editor backup files do not)
fn is_record_name(file_name: &str) -> bool {
    if file_name.is_empty() || file_name.starts_with('.') {
        return false;
    }

    if file_name.ends_with('~')
        || file_name.ends_with(".tmp")
        || file_name.ends_with(".temp")
        || file_name.ends_with(".swp")
    {
        return false;
    }

    true
}

fn record_name(path: &Path) -> Option<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| is_record_name(n))
}

#[cfg(unix)]
fn record_id(meta: &fs::Metadata) -> RecordId {
    use std::os::unix::fs::MetadataExt;
    RecordId(meta.ino())
}

#[cfg(not(unix))]
fn record_id(meta: &fs::Metadata) -> RecordId {
    let nanos = meta
        .created()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    RecordId(nanos)
}

/// Id of a record file that currently exists
fn stat_record(path: &Path) -> Option<RecordId> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    Some(record_id(&meta))
}

/// Parse a record body, defaulting every missing or malformed attribute
fn parse_fields(name: &str, body: &str) -> RecordFields {
    if body.trim().is_empty() {
        return RecordFields::default();
    }
    match serde_yaml::from_str::<RecordFields>(body) {
        Ok(fields) => fields,
        Err(e) => {
            debug!("Record '{name}' has unreadable attributes, using defaults: {e}");
            RecordFields::default()
        }
    }
}

/// Point `name` at `id`, reporting the record it displaced, if any.
/// A file replaced in place (save-to-temp then rename over) carries a new id.
fn reindex(
    index: &DashMap<String, RecordId>,
    name: &str,
    id: RecordId,
    out: &mut Vec<StorageNotification>,
) {
    if let Some(previous) = index.insert(name.to_string(), id) {
        if previous != id {
            out.push(StorageNotification::Removed { id: previous });
        }
    }
}

/// Translate one raw watcher event into record notifications
fn translate(
    event: &notify::Event,
    dir: &Path,
    index: &DashMap<String, RecordId>,
    watched: &DashSet<RecordId>,
) -> Vec<StorageNotification> {
    let mut out = Vec::new();

    for path in &event.paths {
        if path.parent() != Some(dir) {
            continue;
        }
        let Some(name) = record_name(path) else {
            continue;
        };

        match &event.kind {
            EventKind::Create(_) => {
                if let Some(id) = stat_record(path) {
                    reindex(index, name, id, &mut out);
                    out.push(StorageNotification::Created {
                        id,
                        scope: dir.to_path_buf(),
                        name: name.to_string(),
                    });
                }
            }
            EventKind::Remove(_) => {
                if let Some((_, id)) = index.remove(name) {
                    out.push(StorageNotification::Removed { id });
                }
            }
            // Both is reported in addition to the From/To halves
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {}
            EventKind::Modify(ModifyKind::Name(_)) => match stat_record(path) {
                Some(id) => {
                    index.retain(|other, v| *v != id || other == name);
                    reindex(index, name, id, &mut out);
                    out.push(StorageNotification::Renamed {
                        id,
                        new_scope: Some(dir.to_path_buf()),
                        new_name: name.to_string(),
                    });
                }
                None => {
                    if let Some((_, id)) = index.remove(name) {
                        out.push(StorageNotification::Renamed {
                            id,
                            new_scope: None,
                            new_name: name.to_string(),
                        });
                    }
                }
            },
            EventKind::Modify(_) => {
                let id = index.get(name).map(|entry| *entry.value());
                if let Some(id) = id {
                    if watched.contains(&id) {
                        out.push(StorageNotification::AttributeChanged { id });
                    }
                }
            }
            _ => {}
        }
    }

    out
}

impl RecordStore for FsRecordStore {
    fn scope(&self) -> &Path {
        &self.dir
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }

    fn enumerate(&self) -> Result<Vec<RecordHandle>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Events directory not found ({})", self.dir.display()))?;

        let mut handles = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {e}");
                    continue;
                }
            };
            let path = entry.path();
            let Some(name) = record_name(&path) else {
                continue;
            };
            let Some(id) = stat_record(&path) else {
                continue;
            };
            self.index.insert(name.to_string(), id);
            handles.push(RecordHandle {
                id,
                name: name.to_string(),
            });
        }

        handles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(handles)
    }

    fn read_record(&self, name: &str) -> Result<(RecordId, RecordFields)> {
        let path = self.path_of(name);
        let id = stat_record(&path).ok_or_else(|| anyhow!("No record at {}", path.display()))?;
        let body = fs::read_to_string(&path).unwrap_or_default();
        self.index.insert(name.to_string(), id);
        Ok((id, parse_fields(name, &body)))
    }

    fn write_record(&self, name: &str, fields: &RecordFields) -> Result<RecordId> {
        if !is_record_name(name) {
            return Err(anyhow!("'{}' is not a valid record name", name));
        }
        let path = self.path_of(name);
        let body = serde_yaml::to_string(fields)?;
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        stat_record(&path).ok_or_else(|| anyhow!("Record vanished after write: {}", path.display()))
    }

    fn remove_record(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<StorageNotification>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dir = self.dir.clone();
        let index = self.index.clone();
        let watched = self.watched.clone();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for notification in translate(&event, &dir, &index, &watched) {
                        if let Err(e) = tx.send(notification) {
                            debug!("Dropping record notification, listener gone: {e}");
                        }
                    }
                }
                Err(e) => error!("Events directory watcher error: {e}"),
            })?;

        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;
        info!("Watching {} for record changes", self.dir.display());

        *self.lock_watcher() = Some(watcher);
        Ok(rx)
    }

    fn watch_record(&self, id: RecordId) {
        self.watched.insert(id);
    }

    fn unwatch_record(&self, id: RecordId) {
        self.watched.remove(&id);
    }

    fn stop_watching(&self) {
        if self.lock_watcher().take().is_some() {
            info!("Stopped watching {}", self.dir.display());
        }
        self.watched.clear();
    }
}

impl Drop for FsRecordStore {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::time::Duration;
    use tempfile::tempdir;

    fn raw(kind: EventKind, path: PathBuf) -> notify::Event {
        notify::Event::new(kind).add_path(path)
    }

    #[test]
    fn test_record_name_filter() {
        assert!(is_record_name("dentist"));
        assert!(is_record_name("team meeting.event"));
        assert!(!is_record_name(".hidden"));
        assert!(!is_record_name("draft~"));
        assert!(!is_record_name("write.tmp"));
        assert!(!is_record_name(".dentist.swp"));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = FsRecordStore::new(dir.path());
        let fields = RecordFields::new(1_900_000_000, "Office", "Quarterly review");

        let id = store.write_record("review", &fields).unwrap();
        let (read_id, read_fields) = store.read_record("review").unwrap();

        assert_eq!(read_id, id);
        assert_eq!(read_fields, fields);
    }

    #[test]
    fn test_missing_and_malformed_attributes_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("empty"), "").unwrap();
        fs::write(dir.path().join("partial"), "what: Call mom\n").unwrap();
        fs::write(dir.path().join("garbage"), "{{{ not yaml").unwrap();
        let store = FsRecordStore::new(dir.path());

        assert_eq!(store.read_record("empty").unwrap().1, RecordFields::default());
        let partial = store.read_record("partial").unwrap().1;
        assert_eq!(partial.when, 0);
        assert_eq!(partial.location, "");
        assert_eq!(partial.description, "Call mom");
        assert_eq!(store.read_record("garbage").unwrap().1, RecordFields::default());
    }

    #[test]
    fn test_enumerate_skips_hidden_and_directories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), "when: 1\n").unwrap();
        fs::write(dir.path().join("b"), "when: 2\n").unwrap();
        fs::write(dir.path().join(".hidden"), "when: 3\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        let store = FsRecordStore::new(dir.path());

        let names: Vec<String> = store.enumerate().unwrap().into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = tempdir().unwrap();
        let store = FsRecordStore::new(dir.path().join("Events"));
        assert!(!store.is_available());
        assert!(store.enumerate().is_err());
    }

    #[test]
    fn test_translate_create_and_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dentist");
        fs::write(&path, "when: 5\n").unwrap();
        let index = DashMap::new();
        let watched = DashSet::new();

        let created = translate(
            &raw(EventKind::Create(CreateKind::File), path.clone()),
            dir.path(),
            &index,
            &watched,
        );
        let id = stat_record(&path).unwrap();
        assert_eq!(
            created,
            vec![StorageNotification::Created {
                id,
                scope: dir.path().to_path_buf(),
                name: "dentist".to_string(),
            }]
        );

        fs::remove_file(&path).unwrap();
        let removed = translate(
            &raw(EventKind::Remove(RemoveKind::File), path),
            dir.path(),
            &index,
            &watched,
        );
        assert_eq!(removed, vec![StorageNotification::Removed { id }]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_translate_attribute_change_requires_watch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dentist");
        fs::write(&path, "when: 5\n").unwrap();
        let id = stat_record(&path).unwrap();
        let index = DashMap::new();
        index.insert("dentist".to_string(), id);
        let watched = DashSet::new();
        let modified = || {
            raw(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                path.clone(),
            )
        };

        assert!(translate(&modified(), dir.path(), &index, &watched).is_empty());

        watched.insert(id);
        assert_eq!(
            translate(&modified(), dir.path(), &index, &watched),
            vec![StorageNotification::AttributeChanged { id }]
        );
    }

    #[test]
    fn test_translate_rename_away_and_into_scope() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let path = dir.path().join("trip");
        fs::write(&path, "when: 5\n").unwrap();
        let id = stat_record(&path).unwrap();
        let index = DashMap::new();
        index.insert("trip".to_string(), id);
        let watched = DashSet::new();

        let moved = elsewhere.path().join("trip");
        fs::rename(&path, &moved).unwrap();
        let away = translate(
            &raw(EventKind::Modify(ModifyKind::Name(RenameMode::From)), path.clone()),
            dir.path(),
            &index,
            &watched,
        );
        assert_eq!(
            away,
            vec![StorageNotification::Renamed {
                id,
                new_scope: None,
                new_name: "trip".to_string(),
            }]
        );

        let back = dir.path().join("holiday");
        fs::rename(&moved, &back).unwrap();
        let into = translate(
            &raw(EventKind::Modify(ModifyKind::Name(RenameMode::To)), back),
            dir.path(),
            &index,
            &watched,
        );
        assert_eq!(
            into,
            vec![StorageNotification::Renamed {
                id,
                new_scope: Some(dir.path().to_path_buf()),
                new_name: "holiday".to_string(),
            }]
        );
        assert_eq!(index.get("holiday").map(|e| *e.value()), Some(id));
    }

    #[test]
    fn test_translate_ignores_foreign_paths() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let path = other.path().join("dentist");
        fs::write(&path, "when: 5\n").unwrap();

        let out = translate(
            &raw(EventKind::Create(CreateKind::File), path),
            dir.path(),
            &DashMap::new(),
            &DashSet::new(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_translate_rename_over_existing_emits_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dentist");
        fs::write(&path, "when: 600\nwhat: Old\n").unwrap();
        let old = stat_record(&path).unwrap();
        let index = DashMap::new();
        index.insert("dentist".to_string(), old);
        let watched = DashSet::new();

        // Editor-style save: write a temp file, then rename it over the record
        let staged = dir.path().join("dentist.tmp");
        fs::write(&staged, "when: 900\nwhat: New\n").unwrap();
        fs::rename(&staged, &path).unwrap();
        let new = stat_record(&path).unwrap();
        assert_ne!(old, new);

        let out = translate(
            &raw(EventKind::Modify(ModifyKind::Name(RenameMode::To)), path),
            dir.path(),
            &index,
            &watched,
        );
        assert_eq!(
            out,
            vec![
                StorageNotification::Removed { id: old },
                StorageNotification::Renamed {
                    id: new,
                    new_scope: Some(dir.path().to_path_buf()),
                    new_name: "dentist".to_string(),
                },
            ]
        );
        assert_eq!(index.get("dentist").map(|e| *e.value()), Some(new));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_translate_create_over_stale_entry_emits_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gym");
        fs::write(&path, "when: 5\n").unwrap();
        let id = stat_record(&path).unwrap();
        let stale = RecordId(id.0.wrapping_add(1));
        let index = DashMap::new();
        index.insert("gym".to_string(), stale);

        let out = translate(
            &raw(EventKind::Create(CreateKind::File), path),
            dir.path(),
            &index,
            &DashSet::new(),
        );
        assert_eq!(
            out,
            vec![
                StorageNotification::Removed { id: stale },
                StorageNotification::Created {
                    id,
                    scope: dir.path().to_path_buf(),
                    name: "gym".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_live_watcher_reports_created_record() {
        let dir = tempdir().unwrap();
        let store = FsRecordStore::new(dir.path());
        let mut rx = store.subscribe().unwrap();

        let id = store
            .write_record("dentist", &RecordFields::new(5, "Clinic", "Checkup"))
            .unwrap();

        let created = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Some(StorageNotification::Created { id, .. }) => return Some(id),
                    Some(_) => continue,
                    None => return None,
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(created, Some(id));
        store.stop_watching();
    }
}
