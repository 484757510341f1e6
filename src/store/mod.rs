//! Record store abstraction for feedsync.
//!
//! The reconciler and cleaner only see the [`RecordStore`] trait. Concrete
//! stores are [`NotionStore`] for production and [`MemoryStore`] for tests.

pub mod memory;
pub mod notion;
pub mod types;

use async_trait::async_trait;

use crate::Result;

pub use memory::{MemoryStore, WriteOp};
pub use notion::NotionStore;
pub use types::{FieldValue, Fields, Record, MAX_TEXT_LENGTH, NAME, PUBLISH, STATUS, TAGS, URL};

/// Document store holding synced feed items.
///
/// Search failures are reported as [`crate::FeedsyncError::Search`], write
/// failures as [`crate::FeedsyncError::Write`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Full-text search, most recently edited first.
    async fn search(&self, query: &str) -> Result<Vec<Record>>;

    /// Create a record in the `parent` collection.
    async fn create(&self, parent: &str, fields: &Fields) -> Result<Record>;

    /// Overwrite the given fields of an existing record.
    async fn update(&self, id: &str, fields: &Fields) -> Result<Record>;

    /// Soft-delete a record.
    async fn archive(&self, id: &str) -> Result<()>;
}
