//! Feed to record store synchronization.
//!
//! [`Reconciler`] mirrors fresh feed items into the store, [`Cleaner`]
//! archives stale records, and [`SyncRunner`] drives either over every
//! configured feed.

pub mod cleaner;
pub mod mapping;
pub mod reconciler;
pub mod runner;

pub use cleaner::{CleanReport, Cleaner};
pub use mapping::{cutoff, fields_from_item, record_name, resolve_title};
pub use reconciler::{ReconcileReport, Reconciler};
pub use runner::{Command, FeedOutcome, RunSummary, SyncRunner};
