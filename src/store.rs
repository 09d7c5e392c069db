//! Entry store
//!
//! Append, identify, sort and delete operations over the persisted entry
//! collection. Actual load/save is delegated to a [`LogStorage`]
//! implementation. Every mutation re-sorts the whole collection descending
//! by timestamp before persisting, so on-disk order is always
//! most-recent-first; recency-bounded views rely on this.
//!
//! Single-writer, synchronous: whole-document overwrite semantics with no
//! locking or conflict detection.

use crate::error::LogError;
use crate::query::QueryWindow;
use crate::types::{Entry, EntryLog};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Persistence collaborator for the entry collection.
pub trait LogStorage {
    fn load(&self) -> Result<EntryLog, LogError>;
    fn save(&self, log: &EntryLog) -> Result<(), LogError>;
}

/// Whole-file JSON persistence.
///
/// A missing file or one that does not parse as a log loads as an empty
/// collection; saves overwrite the full document.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileStorage {
        JsonFileStorage { path: path.into() }
    }
}

impl LogStorage for JsonFileStorage {
    fn load(&self) -> Result<EntryLog, LogError> {
        if !self.path.exists() {
            return Ok(EntryLog::default());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    fn save(&self, log: &EntryLog) -> Result<(), LogError> {
        let text = serde_json::to_string_pretty(log)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// In-memory storage for tests and previews.
#[derive(Default)]
pub struct MemoryStorage {
    log: RefCell<EntryLog>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn with_log(log: EntryLog) -> MemoryStorage {
        MemoryStorage { log: RefCell::new(log) }
    }

    /// Copy of the last saved log.
    pub fn snapshot(&self) -> EntryLog {
        self.log.borrow().clone()
    }
}

impl LogStorage for MemoryStorage {
    fn load(&self) -> Result<EntryLog, LogError> {
        Ok(self.log.borrow().clone())
    }

    fn save(&self, log: &EntryLog) -> Result<(), LogError> {
        *self.log.borrow_mut() = log.clone();
        Ok(())
    }
}

/// The entry collection plus its persistence collaborator.
pub struct EntryStore<S: LogStorage> {
    storage: S,
    log: EntryLog,
}

impl<S: LogStorage> EntryStore<S> {
    /// Load the collection once at startup.
    pub fn open(storage: S) -> Result<EntryStore<S>, LogError> {
        let log = storage.load()?;
        Ok(EntryStore { storage, log })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.log.entries
    }

    pub fn len(&self) -> usize {
        self.log.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.entries.is_empty()
    }

    /// Append one observation.
    ///
    /// Assigns a fresh id when the entry has none, re-sorts the whole
    /// collection most-recent-first and persists. Returns the entry's id.
    pub fn append(&mut self, mut entry: Entry) -> Result<String, LogError> {
        let id = entry.id.clone().unwrap_or_else(new_entry_id);
        entry.id = Some(id.clone());
        self.log.entries.push(entry);
        self.sort_entries();
        self.storage.save(&self.log)?;
        Ok(id)
    }

    /// Assign ids to legacy entries lacking one.
    ///
    /// Persists only when at least one id was assigned; running it again
    /// with all ids present is a no-op. Returns the count backfilled.
    pub fn backfill_ids(&mut self) -> Result<usize, LogError> {
        let mut assigned = 0;
        for entry in &mut self.log.entries {
            if entry.id.is_none() {
                entry.id = Some(new_entry_id());
                assigned += 1;
            }
        }
        if assigned > 0 {
            self.storage.save(&self.log)?;
        }
        Ok(assigned)
    }

    /// Remove every entry whose id is a member of `ids`.
    ///
    /// Persists and returns the count removed; zero matches is a zero
    /// count, not an error.
    pub fn delete_by_ids(&mut self, ids: &HashSet<String>) -> Result<usize, LogError> {
        let before = self.log.entries.len();
        self.log
            .entries
            .retain(|entry| !matches!(&entry.id, Some(id) if ids.contains(id)));
        let removed = before - self.log.entries.len();
        self.storage.save(&self.log)?;
        Ok(removed)
    }

    /// Remove every entry whose parsed timestamp falls inside the window.
    ///
    /// Entries with unparseable timestamps are never matched, hence never
    /// deleted by this path.
    pub fn delete_by_range(&mut self, window: &QueryWindow) -> Result<usize, LogError> {
        let before = self.log.entries.len();
        self.log
            .entries
            .retain(|entry| !entry.timestamp().is_some_and(|ts| window.contains(ts)));
        let removed = before - self.log.entries.len();
        self.storage.save(&self.log)?;
        Ok(removed)
    }

    /// Clear the collection unconditionally; returns the count removed.
    pub fn delete_all(&mut self) -> Result<usize, LogError> {
        let removed = self.log.entries.len();
        self.log.entries.clear();
        self.storage.save(&self.log)?;
        Ok(removed)
    }

    fn sort_entries(&mut self) {
        // ISO-8601 timestamp strings order lexicographically the same as
        // their parsed values.
        self.log.entries.sort_by(|a, b| b.ts.cmp(&a.ts));
    }
}

/// Collision-resistant random id, 32 lowercase hex chars.
fn new_entry_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetricId;
    use crate::types::MetricValue;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn entry(ts: &str, hr: i64) -> Entry {
        let mut e = Entry::new(ts);
        e.set(MetricId::Hr, MetricValue::Int(hr));
        e
    }

    fn store_with(entries: Vec<Entry>) -> EntryStore<MemoryStorage> {
        let storage = MemoryStorage::with_log(EntryLog {
            entries,
            ..EntryLog::default()
        });
        EntryStore::open(storage).unwrap()
    }

    #[test]
    fn test_append_assigns_id_and_sorts_descending() {
        let mut store = store_with(Vec::new());
        store.append(entry("2024-01-10T08:00:00", 70)).unwrap();
        store.append(entry("2024-01-20T08:00:00", 72)).unwrap();
        let id = store.append(entry("2024-01-15T08:00:00", 74)).unwrap();

        assert_eq!(id.len(), 32);
        let order: Vec<&str> = store.entries().iter().map(|e| e.ts.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "2024-01-20T08:00:00",
                "2024-01-15T08:00:00",
                "2024-01-10T08:00:00",
            ]
        );
        for e in store.entries() {
            assert!(e.id.is_some());
        }
    }

    #[test]
    fn test_append_persists_sorted_order() {
        let storage = MemoryStorage::new();
        let mut store = EntryStore::open(storage).unwrap();
        store.append(entry("2024-01-10T08:00:00", 70)).unwrap();
        store.append(entry("2024-01-20T08:00:00", 72)).unwrap();

        // Reopen from the same storage: descending order survived the trip.
        let reopened = EntryStore::open(MemoryStorage::with_log(
            store.storage.snapshot(),
        ))
        .unwrap();
        let order: Vec<&str> = reopened.entries().iter().map(|e| e.ts.as_str()).collect();
        assert_eq!(order, vec!["2024-01-20T08:00:00", "2024-01-10T08:00:00"]);
    }

    #[test]
    fn test_backfill_ids_is_idempotent() {
        let mut legacy = entry("2024-01-10T08:00:00", 70);
        legacy.id = None;
        let mut tagged = entry("2024-01-12T08:00:00", 72);
        tagged.id = Some("keep-me".to_string());

        let mut store = store_with(vec![legacy, tagged]);
        assert_eq!(store.backfill_ids().unwrap(), 1);
        assert_eq!(store.backfill_ids().unwrap(), 0);

        let ids: Vec<Option<&str>> =
            store.entries().iter().map(|e| e.id.as_deref()).collect();
        assert!(ids.iter().all(|id| id.is_some()));
        assert!(ids.contains(&Some("keep-me")));
    }

    #[test]
    fn test_delete_by_ids_leaves_others_untouched() {
        let mut store = store_with(Vec::new());
        let id_a = store.append(entry("2024-01-10T08:00:00", 70)).unwrap();
        let _id_b = store.append(entry("2024-01-12T08:00:00", 72)).unwrap();
        let id_c = store.append(entry("2024-01-14T08:00:00", 74)).unwrap();

        let survivor_before = serde_json::to_value(
            store
                .entries()
                .iter()
                .find(|e| e.id.as_deref() != Some(id_a.as_str()) && e.id.as_deref() != Some(id_c.as_str()))
                .unwrap(),
        )
        .unwrap();

        let ids: HashSet<String> = [id_a, id_c].into_iter().collect();
        assert_eq!(store.delete_by_ids(&ids).unwrap(), 2);
        assert_eq!(store.len(), 1);

        let survivor_after = serde_json::to_value(&store.entries()[0]).unwrap();
        assert_eq!(survivor_after, survivor_before);
    }

    #[test]
    fn test_delete_by_ids_zero_matches() {
        let mut store = store_with(vec![entry("2024-01-10T08:00:00", 70)]);
        let ids: HashSet<String> = ["nope".to_string()].into_iter().collect();
        assert_eq!(store.delete_by_ids(&ids).unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_by_range_skips_unparseable() {
        let mut store = store_with(vec![
            entry("2024-01-10T08:00:00", 70),
            entry("2024-01-15T08:00:00", 72),
            entry("corrupt", 74),
        ]);
        let window = QueryWindow::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        assert_eq!(store.delete_by_range(&window).unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].ts, "corrupt");
    }

    #[test]
    fn test_delete_by_range_inclusive_bounds() {
        let mut store = store_with(vec![
            entry("2024-01-15T00:00:00", 70),
            entry("2024-01-16T23:59:59", 72),
            entry("2024-01-17T00:00:00", 74),
        ]);
        let window = QueryWindow::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
        );
        assert_eq!(store.delete_by_range(&window).unwrap(), 2);
        assert_eq!(store.entries()[0].ts, "2024-01-17T00:00:00");
    }

    #[test]
    fn test_delete_all() {
        let mut store = store_with(vec![
            entry("2024-01-10T08:00:00", 70),
            entry("2024-01-12T08:00:00", 72),
        ]);
        assert_eq!(store.delete_all().unwrap(), 2);
        assert!(store.is_empty());
        assert_eq!(store.delete_all().unwrap(), 0);
    }

    #[test]
    fn test_deletes_persist() {
        let storage = MemoryStorage::new();
        let mut store = EntryStore::open(storage).unwrap();
        let id = store.append(entry("2024-01-10T08:00:00", 70)).unwrap();
        store.append(entry("2024-01-12T08:00:00", 72)).unwrap();

        let ids: HashSet<String> = [id].into_iter().collect();
        store.delete_by_ids(&ids).unwrap();

        let saved = store.storage.snapshot();
        assert_eq!(saved.entries.len(), 1);
        assert_eq!(saved.entries[0].ts, "2024-01-12T08:00:00");
    }

    #[test]
    fn test_json_file_storage_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "bodylog-test-{}.json",
            Uuid::new_v4().simple()
        ));
        let storage = JsonFileStorage::new(&path);

        // Missing file loads as empty.
        assert!(storage.load().unwrap().entries.is_empty());

        let mut store = EntryStore::open(JsonFileStorage::new(&path)).unwrap();
        store.append(entry("2024-01-10T08:00:00", 70)).unwrap();
        store.append(entry("2024-01-20T08:00:00", 72)).unwrap();

        let reloaded = JsonFileStorage::new(&path).load().unwrap();
        assert_eq!(reloaded.entries.len(), 2);
        assert_eq!(reloaded.entries[0].ts, "2024-01-20T08:00:00");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_json_file_storage_malformed_loads_empty() {
        let path = std::env::temp_dir().join(format!(
            "bodylog-test-{}.json",
            Uuid::new_v4().simple()
        ));
        std::fs::write(&path, "not json at all").unwrap();
        let loaded = JsonFileStorage::new(&path).load().unwrap();
        assert!(loaded.entries.is_empty());
        std::fs::remove_file(&path).ok();
    }
}
