//! Create-or-update pass mirroring fresh feed items into the record store.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::feed::FeedSource;
use crate::store::{Record, RecordStore};
use crate::sync::mapping::{cutoff, fields_from_item, resolve_title};
use crate::Result;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Resolved feed title.
    pub feed_title: String,
    /// Records created.
    pub created: usize,
    /// Records updated.
    pub updated: usize,
    /// Items skipped (undated, stale, or archived in the store).
    pub skipped: usize,
    /// Creates or updates that failed.
    pub failed: usize,
}

/// Correlation of stored URLs to record IDs.
#[derive(Debug, Default)]
struct Correlation {
    active: HashMap<String, String>,
    archived: HashSet<String>,
}

impl Correlation {
    /// Later candidates overwrite earlier ones sharing a URL.
    fn build(candidates: &[Record]) -> Self {
        let mut correlation = Self::default();
        for record in candidates {
            let Some(url) = record.url() else {
                continue;
            };
            if record.archived {
                correlation.archived.insert(url.to_string());
            } else {
                correlation.active.insert(url.to_string(), record.id.clone());
            }
        }
        correlation
    }
}

/// Mirrors fresh feed items into the record store.
pub struct Reconciler<'a> {
    source: &'a dyn FeedSource,
    store: &'a dyn RecordStore,
    database_id: String,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler writing new records into `database_id`.
    pub fn new(
        source: &'a dyn FeedSource,
        store: &'a dyn RecordStore,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            database_id: database_id.into(),
        }
    }

    /// Reconcile one feed.
    ///
    /// # Errors
    ///
    /// Returns an error, without writing anything, if:
    /// - the feed cannot be fetched or parsed
    /// - the feed has no usable title
    /// - the store search fails
    ///
    /// Individual create/update failures are logged and counted in the
    /// report instead.
    pub async fn reconcile(&self, feed: &FeedConfig, now: DateTime<Utc>) -> Result<ReconcileReport> {
        let fetched = self.source.fetch(&feed.url).await?;
        let title = resolve_title(feed, &fetched)?;

        let candidates = self.store.search(&title).await?;
        let correlation = Correlation::build(&candidates);
        debug!(
            "{}: {} candidate(s), {} correlated",
            title,
            candidates.len(),
            correlation.active.len()
        );

        let cutoff = cutoff(now, feed.expires);
        let mut report = ReconcileReport {
            feed_title: title.clone(),
            ..Default::default()
        };

        for item in &fetched.items {
            let Some(published_at) = item.published_at else {
                debug!("skipped {} (no publish date)", item.link);
                report.skipped += 1;
                continue;
            };
            if published_at < cutoff {
                debug!("skipped {} (published {})", item.link, published_at);
                report.skipped += 1;
                continue;
            }

            let fields = fields_from_item(&title, &feed.tags, item);

            match correlation.active.get(&item.link) {
                Some(id) => match self.store.update(id, &fields).await {
                    Ok(_) => {
                        info!("updated {}", item.link);
                        report.updated += 1;
                    }
                    Err(e) => {
                        warn!("failed to update {}: {}", item.link, e);
                        report.failed += 1;
                    }
                },
                None if correlation.archived.contains(&item.link) => {
                    debug!("skipped {} (archived)", item.link);
                    report.skipped += 1;
                }
                None => match self.store.create(&self.database_id, &fields).await {
                    Ok(_) => {
                        info!("created {}", item.link);
                        report.created += 1;
                    }
                    Err(e) => {
                        warn!("failed to create {}: {}", item.link, e);
                        report.failed += 1;
                    }
                },
            }
        }

        Ok(report)
    }
}
