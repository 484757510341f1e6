//! Configuration module for feedsync.

use serde::Deserialize;
use std::path::Path;

use crate::{FeedsyncError, Result};

/// A monitored feed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Feed URL.
    pub url: String,
    /// Display title. Falls back to the fetched feed title when absent.
    #[serde(default)]
    pub title: Option<String>,
    /// Labels attached to every record created from this feed.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Expiry window in seconds (0 = use the global default).
    #[serde(default)]
    pub expires: u64,
}

impl FeedConfig {
    /// Create a feed config with only a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            tags: Vec::new(),
            expires: 0,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the expiry window in seconds.
    pub fn with_expires(mut self, secs: u64) -> Self {
        self.expires = secs;
        self
    }

    /// Configured title, ignoring empty strings.
    pub fn configured_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// Cleanup configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CleanConfig {
    /// Status values eligible for archival.
    #[serde(default)]
    pub status: Vec<String>,
}

/// Notion API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionConfig {
    /// Integration token.
    #[serde(default)]
    pub token: String,
    /// Target database ID.
    #[serde(default)]
    pub database_id: String,
    /// API base URL.
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    /// Value of the Notion-Version header.
    #[serde(default = "default_notion_version")]
    pub version: String,
    /// Maximum number of search result pages to follow.
    #[serde(default = "default_notion_max_search_pages")]
    pub max_search_pages: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_notion_timeout")]
    pub timeout_secs: u64,
}

fn default_notion_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_notion_max_search_pages() -> usize {
    10
}

fn default_notion_timeout() -> u64 {
    30
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            database_id: String::new(),
            base_url: default_notion_base_url(),
            version: default_notion_version(),
            max_search_pages: default_notion_max_search_pages(),
            timeout_secs: default_notion_timeout(),
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Reject loopback, private and internal hosts. Off by default so
    /// intranet feeds work.
    #[serde(default)]
    pub block_private_hosts: bool,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_user_agent() -> String {
    concat!("feedsync/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            user_agent: default_user_agent(),
            block_private_hosts: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file. Console output is always enabled.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Default expiry window in seconds.
    #[serde(default)]
    pub expires: u64,
    /// Cleanup configuration.
    #[serde(default)]
    pub clean: CleanConfig,
    /// Monitored feeds, processed in order.
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    /// Notion configuration.
    #[serde(default)]
    pub notion: NotionConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML or TOML file.
    ///
    /// The format is chosen by extension (`.toml` is TOML, anything else is
    /// YAML). Per-feed defaults are resolved before returning.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(FeedsyncError::Io)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::parse_toml(&content),
            _ => Self::parse_yaml(&content),
        }
    }

    /// Load configuration and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse_yaml(s: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        let mut config: Config = if s.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(s)
                .map_err(|e| FeedsyncError::Config(format!("config parse error: {e}")))?
        };
        config.apply_feed_defaults();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(s: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(s)
            .map_err(|e| FeedsyncError::Config(format!("config parse error: {e}")))?;
        config.apply_feed_defaults();
        Ok(config)
    }

    /// Substitute the global expiry window for feeds that leave it at zero.
    pub fn apply_feed_defaults(&mut self) {
        for feed in &mut self.feeds {
            if feed.expires == 0 {
                feed.expires = self.expires;
            }
        }
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NOTION_TOKEN`: Notion integration token
    /// - `NOTION_DATABASE_ID`: target database ID
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("NOTION_TOKEN") {
            if !token.is_empty() {
                self.notion.token = token;
            }
        }
        if let Ok(database_id) = std::env::var("NOTION_DATABASE_ID") {
            if !database_id.is_empty() {
                self.notion.database_id = database_id;
            }
        }
    }

    /// Validate the feed list.
    pub fn validate(&self) -> Result<()> {
        for (i, feed) in self.feeds.iter().enumerate() {
            if feed.url.trim().is_empty() {
                return Err(FeedsyncError::Validation(format!(
                    "feeds[{i}]: url must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Validate the settings required to talk to Notion.
    ///
    /// The database ID is only needed by commands that create records.
    pub fn validate_for_store(&self, require_database_id: bool) -> Result<()> {
        if self.notion.token.is_empty() {
            return Err(FeedsyncError::Validation(
                "Notion token is not set. \
                 Set notion.token in the config file or the NOTION_TOKEN environment variable."
                    .to_string(),
            ));
        }
        if require_database_id && self.notion.database_id.is_empty() {
            return Err(FeedsyncError::Validation(
                "Notion database ID is not set. \
                 Set notion.database_id in the config file or the NOTION_DATABASE_ID environment variable."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand `$VAR` and `${VAR}` references from the environment.
///
/// Unset variables expand to an empty string.
pub fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed {
                    out.push_str(&lookup(&name).unwrap_or_default());
                } else {
                    out.push_str("${");
                    out.push_str(&name);
                }
            }
            Some(c) if c.is_ascii_alphanumeric() || *c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&lookup(&name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out
}
