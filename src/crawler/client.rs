//! Crawl client contract
//!
//! The crawl loop only depends on the [`CrawlClient`] trait and the
//! [`CrawlResult`] shape. `CrawlResult` deserializes tolerantly (every field
//! optional, links as objects or bare strings) so payloads from external
//! crawl services can drift without breaking the core.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a crawl client instead of returning a result
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Per-request options passed to the crawl client
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overrides the client's default request timeout
    pub timeout: Option<Duration>,
}

/// An outbound link found on a crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlLink {
    pub href: String,
}

/// Result of crawling a single URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlResult {
    pub success: bool,

    /// Final URL after redirects (may be empty in vendor payloads)
    pub url: String,

    /// Page content as markdown or plain text
    pub markdown: Option<String>,

    #[serde(deserialize_with = "deserialize_links")]
    pub links: Vec<CrawlLink>,

    /// Page metadata (`title`, `h1`, `description`, ...)
    pub metadata: serde_json::Map<String, serde_json::Value>,

    pub error: Option<String>,

    pub status_code: Option<u16>,
}

impl CrawlResult {
    /// Builds a failed result
    pub fn failure(url: &str, error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            success: false,
            url: url.to_string(),
            error: Some(error.into()),
            status_code,
            ..Default::default()
        }
    }

    /// Reads a string metadata field, ignoring non-string values
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Page title from metadata
    pub fn title(&self) -> Option<&str> {
        self.metadata_str("title")
    }

    /// First heading from metadata
    pub fn h1(&self) -> Option<&str> {
        self.metadata_str("h1")
    }

    /// Meta description, accepting either `description` or `meta_description`
    pub fn meta_description(&self) -> Option<&str> {
        self.metadata_str("description")
            .or_else(|| self.metadata_str("meta_description"))
    }
}

fn deserialize_links<'de, D>(deserializer: D) -> Result<Vec<CrawlLink>, D::Error>
where
    D: Deserializer<'de>,
{
    // Links arrive as bare strings or `{ "href": ... }` objects; anything else is dropped
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|link| match link {
            serde_json::Value::String(href) => Some(href),
            serde_json::Value::Object(mut fields) => match fields.remove("href") {
                Some(serde_json::Value::String(href)) => Some(href),
                _ => None,
            },
            _ => None,
        })
        .filter(|href| !href.trim().is_empty())
        .map(|href| CrawlLink { href })
        .collect())
}

/// A collaborator that fetches one URL at a time
#[async_trait]
pub trait CrawlClient: Send + Sync {
    /// Fetches a URL
    ///
    /// A page-level failure (HTTP error, non-HTML content) is returned as
    /// `Ok` with `success == false`; an `Err` signals the request itself
    /// could not be carried out. Callers treat both as a failed page.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<CrawlResult, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerant_parsing_of_partial_payload() {
        let result: CrawlResult = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(result.success);
        assert!(result.links.is_empty());
        assert_eq!(result.markdown, None);
        assert_eq!(result.status_code, None);
    }

    #[test]
    fn test_links_as_objects_or_strings() {
        let result: CrawlResult = serde_json::from_str(
            r#"{
                "success": true,
                "url": "https://ex.com/",
                "links": [{"href": "/a", "text": "A"}, "/b", {"text": "no href"}, {"href": 7}, 42, ""]
            }"#,
        )
        .unwrap();
        let hrefs: Vec<&str> = result.links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/a", "/b"]);
    }

    #[test]
    fn test_null_links() {
        let result: CrawlResult = serde_json::from_str(r#"{"links": null}"#).unwrap();
        assert!(result.links.is_empty());
        assert!(!result.success);
    }

    #[test]
    fn test_metadata_accessors() {
        let result: CrawlResult = serde_json::from_str(
            r#"{"metadata": {"title": " Shoes ", "meta_description": "Buy shoes", "h1": 7}}"#,
        )
        .unwrap();
        assert_eq!(result.title(), Some("Shoes"));
        assert_eq!(result.meta_description(), Some("Buy shoes"));
        assert_eq!(result.h1(), None);
    }

    #[test]
    fn test_failure_constructor() {
        let result = CrawlResult::failure("https://ex.com/x", "HTTP 404", Some(404));
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("HTTP 404"));
        assert_eq!(result.status_code, Some(404));
    }
}
