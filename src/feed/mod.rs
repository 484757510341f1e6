//! Feed source module for feedsync.
//!
//! This module fetches and parses RSS/Atom feeds.

pub mod fetcher;
pub mod types;

pub use fetcher::{parse_feed, validate_url, FeedSource, HttpFeedSource};
pub use types::{Feed, FeedItem};
