//! Record types for feedsync.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Title property holding `"<item title> | <feed title>"`.
pub const NAME: &str = "Name";

/// URL property used as the correlation key.
pub const URL: &str = "URL";

/// Multi-select property holding the feed title and configured tags.
pub const TAGS: &str = "Tags";

/// Date property mirroring the item's publish timestamp.
pub const PUBLISH: &str = "Publish";

/// Select property managed by the store's users.
pub const STATUS: &str = "Status";

/// Maximum length, in characters, of a single text value.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// A typed store property value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Title text.
    Title(String),
    /// URL, possibly unset.
    Url(Option<String>),
    /// Multi-select option names.
    MultiSelect(Vec<String>),
    /// Date, possibly without a start value.
    Date(Option<DateTime<Utc>>),
    /// Single select option name, possibly unset.
    Select(Option<String>),
    /// Any other property type, identified by its type name.
    Other(String),
}

/// Property name to value, ordered by name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Opaque record ID.
    pub id: String,
    /// Property values.
    pub fields: Fields,
    /// Whether the record has been archived.
    pub archived: bool,
}

impl Record {
    /// Create a non-archived record.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            archived: false,
        }
    }

    /// The title text of the `Name` property.
    pub fn name(&self) -> Option<&str> {
        match self.fields.get(NAME) {
            Some(FieldValue::Title(title)) => Some(title),
            _ => None,
        }
    }

    /// The correlation URL. `None` when missing, mistyped or empty.
    pub fn url(&self) -> Option<&str> {
        match self.fields.get(URL) {
            Some(FieldValue::Url(Some(url))) if !url.is_empty() => Some(url),
            _ => None,
        }
    }

    /// The `Tags` option names.
    pub fn tags(&self) -> Option<&[String]> {
        match self.fields.get(TAGS) {
            Some(FieldValue::MultiSelect(tags)) => Some(tags),
            _ => None,
        }
    }

    /// The `Publish` start timestamp.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        match self.fields.get(PUBLISH) {
            Some(FieldValue::Date(start)) => *start,
            _ => None,
        }
    }

    /// The `Status` option name.
    ///
    /// A select property without a chosen option yields `Some("")`.
    pub fn status(&self) -> Option<&str> {
        match self.fields.get(STATUS) {
            Some(FieldValue::Select(name)) => Some(name.as_deref().unwrap_or("")),
            _ => None,
        }
    }
}
