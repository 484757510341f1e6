//! Archival pass retiring stale records in a targeted status.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::feed::FeedSource;
use crate::store::{Record, RecordStore};
use crate::sync::mapping::{cutoff, resolve_title};
use crate::Result;

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Resolved feed title.
    pub feed_title: String,
    /// Records archived.
    pub archived: usize,
    /// Candidates left alone.
    pub skipped: usize,
    /// Archive calls that failed.
    pub failed: usize,
}

/// Archives stale records whose status is in the target set.
pub struct Cleaner<'a> {
    source: &'a dyn FeedSource,
    store: &'a dyn RecordStore,
    statuses: HashSet<String>,
}

impl<'a> Cleaner<'a> {
    /// Create a cleaner targeting the given status values.
    pub fn new<I, S>(source: &'a dyn FeedSource, store: &'a dyn RecordStore, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source,
            store,
            statuses: statuses.into_iter().map(Into::into).collect(),
        }
    }

    fn is_eligible(&self, record: &Record, cutoff: DateTime<Utc>) -> bool {
        if record.archived {
            return false;
        }
        match record.status() {
            Some(status) if self.statuses.contains(status) => {}
            _ => return false,
        }
        record
            .published_at()
            .is_some_and(|published_at| published_at < cutoff)
    }

    /// Clean one feed.
    ///
    /// The feed is fetched only to resolve its title for the search query.
    ///
    /// # Errors
    ///
    /// Returns an error, without archiving anything, if the feed cannot be
    /// fetched, has no usable title, or the store search fails. Individual
    /// archive failures are logged and counted in the report instead.
    pub async fn clean(&self, feed: &FeedConfig, now: DateTime<Utc>) -> Result<CleanReport> {
        let fetched = self.source.fetch(&feed.url).await?;
        let title = resolve_title(feed, &fetched)?;

        let candidates = self.store.search(&title).await?;
        debug!("{}: {} candidate(s)", title, candidates.len());

        let cutoff = cutoff(now, feed.expires);
        let mut report = CleanReport {
            feed_title: title,
            ..Default::default()
        };

        for record in &candidates {
            if !self.is_eligible(record, cutoff) {
                report.skipped += 1;
                continue;
            }

            match self.store.archive(&record.id).await {
                Ok(()) => {
                    info!("archived {}", record.id);
                    report.archived += 1;
                }
                Err(e) => {
                    warn!("failed to archive {}: {}", record.id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
