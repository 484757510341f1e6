//! Feed fetcher.
//!
//! Fetches and parses RSS/Atom feeds over HTTP with resource limits and
//! optional SSRF protection.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{FeedsyncError, Result};
use crate::feed::types::{Feed, FeedItem};

/// Source of parsed feeds.
///
/// Dropping the returned future cancels the outstanding request.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<Feed>;
}

/// HTTP feed source backed by reqwest and feed-rs.
pub struct HttpFeedSource {
    client: Client,
    max_feed_size: u64,
    block_private_hosts: bool,
}

impl HttpFeedSource {
    /// Create a new fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FeedsyncError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
            block_private_hosts: config.block_private_hosts,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        let parsed = parse_url(url)?;
        if self.block_private_hosts {
            check_host(&parsed)?;
        }

        debug!("Fetching feed {}", url);

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FeedsyncError::Feed(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FeedsyncError::Feed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(too_large(content_length, self.max_feed_size));
            }
        }

        // Content-Length may be absent or wrong; enforce the limit while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FeedsyncError::Feed(format!("failed to read response: {}", e)))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_feed_size {
                return Err(too_large(body.len() as u64, self.max_feed_size));
            }
        }

        parse_feed(&body)
    }
}

fn too_large(size: u64, max: u64) -> FeedsyncError {
    FeedsyncError::Feed(format!(
        "feed too large: {} bytes (max {} bytes)",
        size, max
    ))
}

fn parse_url(url: &str) -> Result<url::Url> {
    let parsed =
        url::Url::parse(url).map_err(|e| FeedsyncError::Feed(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FeedsyncError::Feed(format!(
            "unsupported URL scheme: {}",
            scheme
        ))),
    }
}

/// Validate a URL for SSRF protection.
///
/// This function checks that:
/// - The URL uses http or https scheme
/// - The host is not a private/loopback address
/// - The host is not a reserved hostname
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = parse_url(url)?;
    check_host(&parsed)
}

fn check_host(parsed: &url::Url) -> Result<()> {
    let host = parsed
        .host()
        .ok_or_else(|| FeedsyncError::Feed("URL has no host".to_string()))?;

    let ip = match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(FeedsyncError::Feed(format!("forbidden host: {}", domain)));
            }
            return Ok(());
        }
        url::Host::Ipv4(ipv4) => IpAddr::V4(ipv4),
        url::Host::Ipv6(ipv6) => IpAddr::V6(ipv6),
    };

    if is_private_ip(&ip) {
        return Err(FeedsyncError::Feed(format!(
            "private IP address not allowed: {}",
            ip
        )));
    }
    Ok(())
}

/// Check if a hostname is forbidden.
fn is_forbidden_hostname(host: &str) -> bool {
    let host_lower = host.to_lowercase();

    if host_lower == "localhost" {
        return true;
    }

    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    FORBIDDEN_SUFFIXES
        .iter()
        .any(|suffix| host_lower.ends_with(suffix))
}

/// Check if an IP address is private/reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                || ipv4.is_documentation()
                // Carrier-grade NAT: 100.64.0.0/10
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }

            let segments = ipv6.segments();
            // Unique local: fc00::/7
            if (segments[0] & 0xfe00) == 0xfc00 {
                return true;
            }
            // Link-local: fe80::/10
            if (segments[0] & 0xffc0) == 0xfe80 {
                return true;
            }
            // IPv4-mapped: ::ffff:a.b.c.d
            if let Some(v4) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(v4));
            }

            false
        }
    }
}

/// Parse feed bytes into a [`Feed`].
pub fn parse_feed(bytes: &[u8]) -> Result<Feed> {
    let feed = parser::parse(bytes)
        .map_err(|e| FeedsyncError::Feed(format!("failed to parse feed: {}", e)))?;

    let title = feed.title.map(|t| t.content).unwrap_or_default();

    let items = feed
        .entries
        .into_iter()
        .map(|entry| FeedItem {
            link: entry_link(&entry.links),
            title: entry.title.map(|t| t.content),
            // Atom entries often carry only <updated>
            published_at: entry.published.or(entry.updated),
        })
        .collect();

    Ok(Feed { title, items })
}

/// The entry's article link.
///
/// `replies` and `edit` links point at comment feeds and editing endpoints,
/// so the first link with no rel, `alternate` or `self` wins; otherwise the
/// first link of any kind.
fn entry_link(links: &[feed_rs::model::Link]) -> String {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("") | Some("alternate") | Some("self")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default()
}
