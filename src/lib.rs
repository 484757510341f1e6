//! feedsync - mirror RSS/Atom feeds into a Notion database.
//!
//! `pull` creates or updates one record per fresh feed item, keyed by the
//! item URL. `clean` archives records whose status is in a configured set
//! once their publish date falls out of the expiry window.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod store;
pub mod sync;

pub use config::{Config, FeedConfig};
pub use error::{FeedsyncError, Result};
pub use feed::{Feed, FeedItem, FeedSource, HttpFeedSource};
pub use store::{FieldValue, Fields, MemoryStore, NotionStore, Record, RecordStore};
pub use sync::{
    CleanReport, Cleaner, Command, FeedOutcome, ReconcileReport, Reconciler, RunSummary,
    SyncRunner,
};
