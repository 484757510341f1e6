//! Runs a sync command over every configured feed.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::feed::FeedSource;
use crate::store::RecordStore;
use crate::sync::cleaner::Cleaner;
use crate::sync::reconciler::Reconciler;

/// Operation selected for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create or update records for fresh feed items.
    Pull,
    /// Archive stale records in the configured statuses.
    Clean,
}

impl Command {
    /// Command name as typed on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Pull => "pull",
            Command::Clean => "clean",
        }
    }
}

/// Result of one feed's pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Feed URL.
    pub url: String,
    /// Feed-level error, if the pass was aborted.
    pub error: Option<String>,
    /// Successful writes.
    pub writes_ok: usize,
    /// Failed writes.
    pub writes_failed: usize,
}

impl FeedOutcome {
    fn failed(url: &str, error: String) -> Self {
        Self {
            url: url.to_string(),
            error: Some(error),
            writes_ok: 0,
            writes_failed: 0,
        }
    }
}

/// Outcomes of one invocation, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Per-feed outcomes.
    pub outcomes: Vec<FeedOutcome>,
}

impl RunSummary {
    /// Number of feeds whose pass completed.
    pub fn feeds_ok(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    /// Number of feeds whose pass was aborted.
    pub fn feeds_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    /// Number of successful writes across all feeds.
    pub fn writes_ok(&self) -> usize {
        self.outcomes.iter().map(|o| o.writes_ok).sum()
    }

    /// Number of failed writes across all feeds.
    pub fn writes_failed(&self) -> usize {
        self.outcomes.iter().map(|o| o.writes_failed).sum()
    }

    /// True when no feed pass and no write failed.
    pub fn is_clean(&self) -> bool {
        self.feeds_failed() == 0 && self.writes_failed() == 0
    }
}

/// Drives the reconciler or cleaner over the configured feeds.
///
/// Feeds are processed one at a time in configuration order; a failing
/// feed never stops the ones after it.
pub struct SyncRunner<'a> {
    source: &'a dyn FeedSource,
    store: &'a dyn RecordStore,
    config: &'a Config,
}

impl<'a> SyncRunner<'a> {
    /// Create a new runner. `config` must already have feed defaults applied.
    pub fn new(source: &'a dyn FeedSource, store: &'a dyn RecordStore, config: &'a Config) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Run `command` over every feed.
    pub async fn run(&self, command: Command, now: DateTime<Utc>) -> RunSummary {
        info!(
            "Running {} over {} feed(s)",
            command.as_str(),
            self.config.feeds.len()
        );

        let summary = match command {
            Command::Pull => self.pull(now).await,
            Command::Clean => self.clean(now).await,
        };

        info!(
            "{} finished: {} feed(s) ok, {} failed, {} write(s) ok, {} failed",
            command.as_str(),
            summary.feeds_ok(),
            summary.feeds_failed(),
            summary.writes_ok(),
            summary.writes_failed()
        );
        summary
    }

    async fn pull(&self, now: DateTime<Utc>) -> RunSummary {
        let reconciler = Reconciler::new(self.source, self.store, &self.config.notion.database_id);
        let mut summary = RunSummary::default();

        for feed in &self.config.feeds {
            let outcome = match reconciler.reconcile(feed, now).await {
                Ok(report) => {
                    info!(
                        "{}: {} created, {} updated, {} skipped, {} failed",
                        report.feed_title,
                        report.created,
                        report.updated,
                        report.skipped,
                        report.failed
                    );
                    FeedOutcome {
                        url: feed.url.clone(),
                        error: None,
                        writes_ok: report.created + report.updated,
                        writes_failed: report.failed,
                    }
                }
                Err(e) => {
                    error!("Failed to pull {}: {}", feed.url, e);
                    FeedOutcome::failed(&feed.url, e.to_string())
                }
            };
            summary.outcomes.push(outcome);
        }

        summary
    }

    async fn clean(&self, now: DateTime<Utc>) -> RunSummary {
        if self.config.clean.status.is_empty() {
            warn!("No clean.status configured; nothing will be archived");
        }

        let cleaner = Cleaner::new(self.source, self.store, self.config.clean.status.iter().cloned());
        let mut summary = RunSummary::default();

        for feed in &self.config.feeds {
            let outcome = match cleaner.clean(feed, now).await {
                Ok(report) => {
                    info!(
                        "{}: {} archived, {} skipped, {} failed",
                        report.feed_title, report.archived, report.skipped, report.failed
                    );
                    FeedOutcome {
                        url: feed.url.clone(),
                        error: None,
                        writes_ok: report.archived,
                        writes_failed: report.failed,
                    }
                }
                Err(e) => {
                    error!("Failed to clean {}: {}", feed.url, e);
                    FeedOutcome::failed(&feed.url, e.to_string())
                }
            };
            summary.outcomes.push(outcome);
        }

        summary
    }
}
