//! Field mapping shared by the reconciler and the cleaner.

use chrono::{DateTime, Duration, Utc};

use crate::config::FeedConfig;
use crate::feed::{Feed, FeedItem};
use crate::store::{FieldValue, Fields, MAX_TEXT_LENGTH, NAME, PUBLISH, TAGS, URL};
use crate::{FeedsyncError, Result};

/// Title used for search and naming: the configured one, else the feed's own.
///
/// Fails when both are empty, since an empty search query matches every
/// record the integration can see.
pub fn resolve_title(config: &FeedConfig, fetched: &Feed) -> Result<String> {
    if let Some(title) = config.configured_title() {
        return Ok(title.to_string());
    }
    if fetched.title.is_empty() {
        return Err(FeedsyncError::Validation(format!(
            "feed {} has no title; set one in the config",
            config.url
        )));
    }
    Ok(fetched.title.clone())
}

/// Oldest timestamp still inside the expiry window.
///
/// Anything strictly before the cutoff is out of the window.
pub fn cutoff(now: DateTime<Utc>, expires_secs: u64) -> DateTime<Utc> {
    i64::try_from(expires_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Record name for an item: `"<item title> | <feed title>"`.
///
/// Long item titles are cut so the name fits the store's text limit with the
/// feed title suffix intact, since search finds records by that suffix.
pub fn record_name(item: &FeedItem, feed_title: &str) -> String {
    let suffix = format!(" | {}", feed_title);
    let room = MAX_TEXT_LENGTH.saturating_sub(suffix.chars().count());
    let title: String = item
        .title
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(room)
        .collect();
    title + &suffix
}

/// Field set written for a feed item.
pub fn fields_from_item(feed_title: &str, tags: &[String], item: &FeedItem) -> Fields {
    let mut options = Vec::with_capacity(tags.len() + 1);
    options.push(feed_title.to_string());
    options.extend(tags.iter().cloned());

    let mut fields = Fields::new();
    fields.insert(NAME.to_string(), FieldValue::Title(record_name(item, feed_title)));
    fields.insert(URL.to_string(), FieldValue::Url(Some(item.link.clone())));
    fields.insert(TAGS.to_string(), FieldValue::MultiSelect(options));
    if let Some(published_at) = item.published_at {
        fields.insert(PUBLISH.to_string(), FieldValue::Date(Some(published_at)));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_title_prefers_config() {
        let config = FeedConfig::new("https://example.com/feed.xml").with_title("Configured");
        let fetched = Feed::new("Fetched");
        assert_eq!(resolve_title(&config, &fetched).unwrap(), "Configured");
    }

    #[test]
    fn test_resolve_title_falls_back_to_feed() {
        let config = FeedConfig::new("https://example.com/feed.xml").with_title("");
        let fetched = Feed::new("Fetched");
        assert_eq!(resolve_title(&config, &fetched).unwrap(), "Fetched");
    }

    #[test]
    fn test_resolve_title_empty() {
        let config = FeedConfig::new("https://example.com/feed.xml");
        let result = resolve_title(&config, &Feed::new(""));
        assert!(matches!(result, Err(FeedsyncError::Validation(_))));
    }

    #[test]
    fn test_cutoff() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(cutoff(now, 0), now);
        assert_eq!(
            cutoff(now, 86400),
            Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap()
        );
        assert_eq!(cutoff(now, u64::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_fields_from_item() {
        let published = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let item = FeedItem::new("https://example.com/1")
            .with_title("Hello")
            .with_published_at(published);
        let tags = vec!["rust".to_string(), "news".to_string()];

        let fields = fields_from_item("Blog", &tags, &item);

        assert_eq!(fields.len(), 4);
        assert_eq!(fields[NAME], FieldValue::Title("Hello | Blog".to_string()));
        assert_eq!(
            fields[URL],
            FieldValue::Url(Some("https://example.com/1".to_string()))
        );
        assert_eq!(
            fields[TAGS],
            FieldValue::MultiSelect(vec!["Blog".into(), "rust".into(), "news".into()])
        );
        assert_eq!(fields[PUBLISH], FieldValue::Date(Some(published)));
    }

    #[test]
    fn test_record_name_keeps_feed_title_when_truncated() {
        let item = FeedItem::new("https://example.com/1").with_title("x".repeat(MAX_TEXT_LENGTH * 2));

        let name = record_name(&item, "Example Blog");

        assert_eq!(name.chars().count(), MAX_TEXT_LENGTH);
        assert!(name.ends_with("x | Example Blog"));
    }

    #[test]
    fn test_record_name_short_title_untouched() {
        let item = FeedItem::new("https://example.com/1").with_title("Hello");
        assert_eq!(record_name(&item, "Blog"), "Hello | Blog");
    }

    #[test]
    fn test_fields_from_item_without_date_or_title() {
        let item = FeedItem::new("https://example.com/2");
        let fields = fields_from_item("Blog", &[], &item);

        assert_eq!(fields[NAME], FieldValue::Title(" | Blog".to_string()));
        assert_eq!(fields[TAGS], FieldValue::MultiSelect(vec!["Blog".into()]));
        assert!(!fields.contains_key(PUBLISH));
    }
}
