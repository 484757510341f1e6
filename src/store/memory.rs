//! In-memory record store.
//!
//! Mirrors the Notion behaviors the sync passes depend on: search matches
//! record titles and returns the most recently edited first, updates merge
//! properties, and archived records are hidden from search. Failures can be
//! injected per URL or record ID.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::types::{FieldValue, Fields, Record, URL};
use super::RecordStore;
use crate::{FeedsyncError, Result};

/// A write observed by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// A record was created.
    Create {
        parent: String,
        id: String,
        fields: Fields,
    },
    /// A record was updated.
    Update { id: String, fields: Fields },
    /// A record was archived.
    Archive { id: String },
}

#[derive(Debug)]
struct Entry {
    record: Record,
    edited: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<Entry>,
    next_id: u64,
    clock: u64,
    writes: Vec<WriteOp>,
    fail_search: bool,
    failing_urls: HashSet<String>,
    failing_ids: HashSet<String>,
    search_includes_archived: bool,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.record.id == id)
            .ok_or_else(|| FeedsyncError::Write(format!("record {} not found", id)))
    }

    fn check_url(&self, fields: &Fields) -> Result<()> {
        if let Some(FieldValue::Url(Some(url))) = fields.get(URL) {
            if self.failing_urls.contains(url) {
                return Err(FeedsyncError::Write(format!("injected failure for {}", url)));
            }
        }
        Ok(())
    }

    fn check_id(&self, id: &str) -> Result<()> {
        if self.failing_ids.contains(id) {
            return Err(FeedsyncError::Write(format!("injected failure for {}", id)));
        }
        Ok(())
    }
}

/// Record store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a record without logging a write. Returns its ID.
    ///
    /// An empty `record.id` is replaced by a generated one.
    pub fn insert(&self, mut record: Record) -> String {
        let mut inner = self.lock();
        if record.id.is_empty() {
            inner.next_id += 1;
            record.id = format!("page-{}", inner.next_id);
        }
        let id = record.id.clone();
        let edited = inner.tick();
        inner.entries.push(Entry { record, edited });
        id
    }

    /// Look up a record by ID, archived or not.
    pub fn get(&self, id: &str) -> Option<Record> {
        self.lock()
            .entries
            .iter()
            .find(|e| e.record.id == id)
            .map(|e| e.record.clone())
    }

    /// All records in insertion order, archived included.
    pub fn records(&self) -> Vec<Record> {
        self.lock().entries.iter().map(|e| e.record.clone()).collect()
    }

    /// Writes performed through the [`RecordStore`] interface, in order.
    pub fn writes(&self) -> Vec<WriteOp> {
        self.lock().writes.clone()
    }

    /// Make every search fail.
    pub fn fail_search(&self, fail: bool) {
        self.lock().fail_search = fail;
    }

    /// Make creates and updates carrying this URL fail.
    pub fn fail_writes_for_url(&self, url: impl Into<String>) {
        self.lock().failing_urls.insert(url.into());
    }

    /// Make updates and archives of this record fail.
    pub fn fail_writes_for_id(&self, id: impl Into<String>) {
        self.lock().failing_ids.insert(id.into());
    }

    /// Return archived records from search as well.
    pub fn search_includes_archived(&self, include: bool) {
        self.lock().search_includes_archived = include;
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn search(&self, query: &str) -> Result<Vec<Record>> {
        let inner = self.lock();
        if inner.fail_search {
            return Err(FeedsyncError::Search("injected search failure".to_string()));
        }

        let needle = query.to_lowercase();
        let mut hits: Vec<&Entry> = inner
            .entries
            .iter()
            .filter(|e| inner.search_includes_archived || !e.record.archived)
            .filter(|e| {
                e.record
                    .name()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .collect();
        hits.sort_by(|a, b| b.edited.cmp(&a.edited));

        Ok(hits.into_iter().map(|e| e.record.clone()).collect())
    }

    async fn create(&self, parent: &str, fields: &Fields) -> Result<Record> {
        let mut inner = self.lock();
        inner.check_url(fields)?;

        inner.next_id += 1;
        let record = Record::new(format!("page-{}", inner.next_id), fields.clone());
        let edited = inner.tick();
        inner.entries.push(Entry {
            record: record.clone(),
            edited,
        });
        inner.writes.push(WriteOp::Create {
            parent: parent.to_string(),
            id: record.id.clone(),
            fields: fields.clone(),
        });
        Ok(record)
    }

    async fn update(&self, id: &str, fields: &Fields) -> Result<Record> {
        let mut inner = self.lock();
        inner.check_id(id)?;
        inner.check_url(fields)?;

        let edited = inner.tick();
        let entry = inner.entry_mut(id)?;
        if entry.record.archived {
            return Err(FeedsyncError::Write(format!(
                "record {} is archived and cannot be edited",
                id
            )));
        }
        entry
            .record
            .fields
            .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        entry.edited = edited;
        let record = entry.record.clone();

        inner.writes.push(WriteOp::Update {
            id: id.to_string(),
            fields: fields.clone(),
        });
        Ok(record)
    }

    async fn archive(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.check_id(id)?;

        let edited = inner.tick();
        let entry = inner.entry_mut(id)?;
        entry.record.archived = true;
        entry.edited = edited;

        inner.writes.push(WriteOp::Archive { id: id.to_string() });
        Ok(())
    }
}
