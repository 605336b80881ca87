//! The schedule record store.
//!
//! The store owns one authoritative in-memory copy of the collection and
//! writes the full collection back on every mutation. A corrupt or missing
//! blob never fails the caller: reads default to an empty collection, with
//! the corruption surfaced through `LoadStatus` and a log diagnostic.
//!
//! The blob is shared across processes with no locking; two concurrent
//! writers silently overwrite each other (last write wins, whole blob).

// Allow dead code: accessors not yet wired to a CLI command
#![allow(dead_code)]

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{RecordDraft, ScheduleRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("failed to write schedule store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode schedule store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outcome of reading the persisted blob when the store was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Blob was present and parsed.
    Loaded,
    /// No blob on disk yet; started empty.
    Missing,
    /// Blob was unreadable or malformed; started empty.
    Corrupt,
}

/// Predicate for search/day/room filtering. Pure, never touches storage.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Exact day match.
    pub day: Option<String>,
    /// Case-insensitive substring match on the room.
    pub room: Option<String>,
    /// Free-text search across all four fields.
    pub query: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &ScheduleRecord) -> bool {
        if let Some(ref day) = self.day {
            if record.day != *day {
                return false;
            }
        }
        if let Some(ref room) = self.room {
            let room = room.trim().to_lowercase();
            if !room.is_empty() && !record.room.to_lowercase().contains(&room) {
                return false;
            }
        }
        if let Some(ref query) = self.query {
            let query = query.trim().to_lowercase();
            if !query.is_empty() {
                let haystack = format!(
                    "{} {} {} {}",
                    record.course_name, record.time, record.room, record.day
                )
                .to_lowercase();
                return haystack.contains(&query);
            }
        }
        true
    }
}

pub struct RecordStore {
    path: PathBuf,
    records: Vec<ScheduleRecord>,
    load_status: LoadStatus,
}

impl RecordStore {
    /// Open the store at `path`, reading the persisted blob.
    ///
    /// A missing blob starts an empty collection; an unreadable or malformed
    /// blob also starts empty but is logged and reported as `Corrupt`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (records, load_status) = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<ScheduleRecord>>(&contents) {
                Ok(records) => (records, LoadStatus::Loaded),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Schedule blob is malformed, starting from an empty collection"
                    );
                    (Vec::new(), LoadStatus::Corrupt)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Vec::new(), LoadStatus::Missing)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read schedule blob, starting from an empty collection"
                );
                (Vec::new(), LoadStatus::Corrupt)
            }
        };
        Self {
            path,
            records,
            load_status,
        }
    }

    pub fn load_status(&self) -> LoadStatus {
        self.load_status
    }

    /// All records in insertion order (insertion order = display order).
    pub fn records(&self) -> &[ScheduleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Next id: one past the persisted maximum.
    ///
    /// Ids are a monotonic counter rather than a wall-clock timestamp, so
    /// bulk imports cannot collide. Timestamp ids from older blobs are just
    /// large integers and seed the counter like any other id.
    fn next_id(&self) -> i64 {
        self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    /// Validate, append, and persist a new record. Returns the assigned id.
    ///
    /// All four fields must be non-empty after trimming; a validation
    /// failure leaves the collection and the blob untouched.
    pub fn add(&mut self, draft: RecordDraft) -> Result<i64, StoreError> {
        let draft = draft.trimmed();
        if draft.course_name.is_empty() {
            return Err(StoreError::EmptyField("course name"));
        }
        if draft.day.is_empty() {
            return Err(StoreError::EmptyField("day"));
        }
        if draft.time.is_empty() {
            return Err(StoreError::EmptyField("time"));
        }
        if draft.room.is_empty() {
            return Err(StoreError::EmptyField("room"));
        }

        let id = self.next_id();
        self.records.push(ScheduleRecord {
            id,
            course_name: draft.course_name,
            day: draft.day,
            time: draft.time,
            room: draft.room,
        });
        self.persist()?;
        debug!(id, total = self.records.len(), "Added schedule record");
        Ok(id)
    }

    /// Remove ALL records with the given id and persist.
    ///
    /// Duplicate ids can exist in externally-produced blobs; every match is
    /// dropped. Removing an unknown id is a no-op and returns 0.
    pub fn remove(&mut self, id: i64) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = before - self.records.len();
        if removed > 0 {
            self.persist()?;
        }
        debug!(id, removed, "Removed schedule records");
        Ok(removed)
    }

    /// Append every acceptable draft, then persist once.
    ///
    /// A draft is accepted when course name and day are non-empty after
    /// trimming (time and room may be empty, matching the import rule of the
    /// original CSV importer). Rejected drafts are skipped silently; only
    /// the aggregate accepted count is returned.
    pub fn import_batch(&mut self, drafts: Vec<RecordDraft>) -> Result<usize, StoreError> {
        let mut next_id = self.next_id();
        let mut accepted = 0;
        for draft in drafts {
            let draft = draft.trimmed();
            if draft.course_name.is_empty() || draft.day.is_empty() {
                continue;
            }
            self.records.push(ScheduleRecord {
                id: next_id,
                course_name: draft.course_name,
                day: draft.day,
                time: draft.time,
                room: draft.room,
            });
            next_id += 1;
            accepted += 1;
        }
        if accepted > 0 {
            self.persist()?;
        }
        debug!(accepted, total = self.records.len(), "Imported schedule records");
        Ok(accepted)
    }

    /// Records matching the filter, in display order. Non-mutating.
    pub fn filter(&self, filter: &RecordFilter) -> Vec<&ScheduleRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Write the full collection back as one JSON document.
    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
