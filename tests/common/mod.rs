//! Test helpers for integration tests.
//!
//! Provides a static feed source, record seeding helpers, and a local HTTP
//! server for tests that exercise the real HTTP clients.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use feedsync::store::{FieldValue, Fields, MemoryStore, Record, NAME, PUBLISH, STATUS, TAGS, URL};
use feedsync::{Feed, FeedItem, FeedSource, FeedsyncError, Result};

/// Fixed "now" used across tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// `now()` minus the given number of seconds.
pub fn secs_ago(secs: i64) -> DateTime<Utc> {
    now() - chrono::Duration::seconds(secs)
}

/// Feed source serving canned feeds by URL.
///
/// Unknown URLs fail like an unreachable host.
#[derive(Default)]
pub struct StaticFeedSource {
    feeds: Mutex<HashMap<String, Feed>>,
    fetches: Mutex<Vec<String>>,
}

impl StaticFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `feed` at `url`, replacing any previous one.
    pub fn with_feed(self, url: &str, feed: Feed) -> Self {
        self.set_feed(url, feed);
        self
    }

    /// Serve `feed` at `url`, replacing any previous one.
    pub fn set_feed(&self, url: &str, feed: Feed) {
        self.feeds.lock().unwrap().insert(url.to_string(), feed);
    }

    /// URLs fetched so far, in order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        self.fetches.lock().unwrap().push(url.to_string());
        self.feeds
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FeedsyncError::Feed(format!("failed to fetch feed: {} unreachable", url)))
    }
}

/// A dated feed item titled after its link's last path segment.
pub fn item(link: &str, published_at: DateTime<Utc>) -> FeedItem {
    let title = link.rsplit('/').next().unwrap_or(link);
    FeedItem::new(link)
        .with_title(format!("Post {}", title))
        .with_published_at(published_at)
}

/// Fields of a record previously synced from `feed_title`.
pub fn synced_fields(feed_title: &str, url: &str, published_at: Option<DateTime<Utc>>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        NAME.to_string(),
        FieldValue::Title(format!("Old title | {}", feed_title)),
    );
    fields.insert(URL.to_string(), FieldValue::Url(Some(url.to_string())));
    fields.insert(
        TAGS.to_string(),
        FieldValue::MultiSelect(vec![feed_title.to_string()]),
    );
    if let Some(published_at) = published_at {
        fields.insert(PUBLISH.to_string(), FieldValue::Date(Some(published_at)));
    }
    fields
}

/// Seed a synced record, optionally with a status. Returns its ID.
pub fn seed(
    store: &MemoryStore,
    feed_title: &str,
    url: &str,
    published_at: Option<DateTime<Utc>>,
    status: Option<&str>,
) -> String {
    let mut fields = synced_fields(feed_title, url, published_at);
    if let Some(status) = status {
        fields.insert(
            STATUS.to_string(),
            FieldValue::Select(Some(status.to_string())),
        );
    }
    store.insert(Record::new("", fields))
}

/// Local HTTP server running an axum router.
pub struct TestHttpServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestHttpServer {
    /// Bind to a random local port and serve `router`.
    pub async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL of the server, without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
