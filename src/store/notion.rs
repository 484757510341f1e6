//! Notion-backed record store.
//!
//! Talks to the Notion REST API: records are pages of one database and
//! fields are page properties.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::types::{FieldValue, Fields, Record, MAX_TEXT_LENGTH};
use super::RecordStore;
use crate::config::NotionConfig;
use crate::{FeedsyncError, Result};

/// Results requested per search page (the API maximum).
const SEARCH_PAGE_SIZE: u32 = 100;

/// Record store backed by a Notion database.
pub struct NotionStore {
    client: Client,
    base_url: String,
    max_search_pages: usize,
}

impl NotionStore {
    /// Create a new store client.
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| FeedsyncError::Config(format!("invalid Notion token: {}", e)))?;
        auth.set_sensitive(true);

        let version = HeaderValue::from_str(&config.version)
            .map_err(|e| FeedsyncError::Config(format!("invalid Notion version: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", version);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedsyncError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_search_pages: config.max_search_pages.max(1),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn page_endpoint(&self, id: &str) -> String {
        self.endpoint(&format!("/v1/pages/{}", urlencoding::encode(id)))
    }

    /// Send a request and return the JSON body of a successful response.
    async fn send(&self, request: RequestBuilder) -> std::result::Result<Value, String> {
        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            // Proxies and gateways may answer with non-JSON bodies.
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::Null);
            return Err(api_error_message(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| format!("HTTP {}: invalid response body: {}", status, e))
    }
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn search(&self, query: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..self.max_search_pages {
            let mut body = json!({
                "query": query,
                "filter": { "property": "object", "value": "page" },
                "sort": { "timestamp": "last_edited_time", "direction": "descending" },
                "page_size": SEARCH_PAGE_SIZE,
            });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let response = self
                .send(self.client.post(self.endpoint("/v1/search")).json(&body))
                .await
                .map_err(FeedsyncError::Search)?;

            let results = response
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| FeedsyncError::Search("malformed search response".to_string()))?;
            records.extend(results.iter().filter_map(record_from_page));

            debug!("search {:?}: page {} returned {} results", query, page + 1, results.len());

            match (
                response.get("has_more").and_then(Value::as_bool),
                response.get("next_cursor").and_then(Value::as_str),
            ) {
                (Some(true), Some(next)) => cursor = Some(next.to_string()),
                _ => return Ok(records),
            }
        }

        warn!(
            "search {:?} truncated after {} pages",
            query, self.max_search_pages
        );
        Ok(records)
    }

    async fn create(&self, parent: &str, fields: &Fields) -> Result<Record> {
        let body = json!({
            "parent": { "type": "database_id", "database_id": parent },
            "properties": properties_json(fields),
        });

        let page = self
            .send(self.client.post(self.endpoint("/v1/pages")).json(&body))
            .await
            .map_err(FeedsyncError::Write)?;

        record_from_page(&page)
            .ok_or_else(|| FeedsyncError::Write("malformed page in create response".to_string()))
    }

    async fn update(&self, id: &str, fields: &Fields) -> Result<Record> {
        let body = json!({ "properties": properties_json(fields) });

        let page = self
            .send(self.client.patch(self.page_endpoint(id)).json(&body))
            .await
            .map_err(FeedsyncError::Write)?;

        record_from_page(&page)
            .ok_or_else(|| FeedsyncError::Write("malformed page in update response".to_string()))
    }

    async fn archive(&self, id: &str) -> Result<()> {
        let body = json!({ "properties": {}, "archived": true });

        self.send(self.client.patch(self.page_endpoint(id)).json(&body))
            .await
            .map_err(FeedsyncError::Write)?;
        Ok(())
    }
}

/// Build a message from a Notion error response.
fn api_error_message(status: reqwest::StatusCode, body: &Value) -> String {
    let code = body.get("code").and_then(Value::as_str);
    let message = body.get("message").and_then(Value::as_str);
    match (code, message) {
        (Some(code), Some(message)) => format!("HTTP {}: {}: {}", status, code, message),
        (None, Some(message)) => format!("HTTP {}: {}", status, message),
        _ => format!("HTTP {}", status),
    }
}

/// Convert a field set to a Notion `properties` object.
///
/// [`FieldValue::Other`] values are not writable and are left out.
pub fn properties_json(fields: &Fields) -> Value {
    let mut properties = Map::new();
    for (name, value) in fields {
        let property = match value {
            FieldValue::Title(text) => json!({
                "title": [{ "type": "text", "text": { "content": truncate_text(text) } }]
            }),
            FieldValue::Url(url) => json!({ "url": url }),
            FieldValue::MultiSelect(options) => json!({
                "multi_select": options.iter().map(|o| json!({ "name": o })).collect::<Vec<_>>()
            }),
            FieldValue::Date(Some(start)) => json!({ "date": { "start": start.to_rfc3339() } }),
            FieldValue::Date(None) => json!({ "date": null }),
            FieldValue::Select(Some(option)) => json!({ "select": { "name": option } }),
            FieldValue::Select(None) => json!({ "select": null }),
            FieldValue::Other(_) => continue,
        };
        properties.insert(name.clone(), property);
    }
    Value::Object(properties)
}

/// Convert a Notion page object to a [`Record`].
///
/// Returns `None` for non-page objects or pages without an ID.
pub fn record_from_page(page: &Value) -> Option<Record> {
    if page.get("object").and_then(Value::as_str) != Some("page") {
        return None;
    }
    let id = page.get("id").and_then(Value::as_str)?;

    let fields: Fields = page
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), field_from_property(prop)))
                .collect()
        })
        .unwrap_or_default();

    let archived = page.get("archived").and_then(Value::as_bool).unwrap_or(false)
        || page.get("in_trash").and_then(Value::as_bool).unwrap_or(false);

    Some(Record {
        id: id.to_string(),
        fields,
        archived,
    })
}

fn field_from_property(prop: &Value) -> FieldValue {
    let kind = prop.get("type").and_then(Value::as_str).unwrap_or_default();
    let option_name = |v: &Value| v.get("name").and_then(Value::as_str).map(str::to_string);

    match kind {
        "title" => FieldValue::Title(
            prop.get("title")
                .and_then(Value::as_array)
                .map(|parts| parts.iter().filter_map(rich_text_content).collect())
                .unwrap_or_default(),
        ),
        "url" => FieldValue::Url(prop.get("url").and_then(Value::as_str).map(str::to_string)),
        "multi_select" => FieldValue::MultiSelect(
            prop.get("multi_select")
                .and_then(Value::as_array)
                .map(|options| options.iter().filter_map(option_name).collect())
                .unwrap_or_default(),
        ),
        "date" => FieldValue::Date(
            prop.get("date")
                .and_then(|d| d.get("start"))
                .and_then(Value::as_str)
                .and_then(parse_date),
        ),
        "select" => FieldValue::Select(prop.get("select").and_then(option_name)),
        other => FieldValue::Other(other.to_string()),
    }
}

fn rich_text_content(part: &Value) -> Option<&str> {
    part.get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| part.pointer("/text/content").and_then(Value::as_str))
}

/// Parse a Notion date `start`: an RFC 3339 timestamp or a bare date.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Truncate text to the rich text length limit.
fn truncate_text(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_LENGTH {
        text.to_string()
    } else {
        text.chars().take(MAX_TEXT_LENGTH).collect()
    }
}
