//! Feed types for feedsync.

use chrono::{DateTime, Utc};

/// A fetched and parsed feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    /// The feed's own title (empty when the document has none).
    pub title: String,
    /// Items in document order.
    pub items: Vec<FeedItem>,
}

impl Feed {
    /// Create a feed with a title and no items.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    /// Append an item.
    pub fn with_item(mut self, item: FeedItem) -> Self {
        self.items.push(item);
        self
    }
}

/// A single feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    /// Link to the original article. Used as the correlation key.
    pub link: String,
    /// Item title.
    pub title: Option<String>,
    /// When the item was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Create an item with only a link.
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: None,
            published_at: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the published timestamp.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}
