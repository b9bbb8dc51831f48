//! HTTP crawl client
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with retry and exponential backoff
//! - Content-Type checks (only HTML is parsed)
//! - Converting responses into [`CrawlResult`]s

use crate::config::{HttpConfig, UserAgentConfig};
use crate::crawler::client::{CrawlClient, CrawlLink, CrawlResult, FetchError, FetchOptions};
use crate::crawler::parser::parse_html;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Largest backoff exponent, bounds the delay at `base * 2^10`
const MAX_BACKOFF_SHIFT: u32 = 10;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use seo_frontier::config::{HttpConfig, UserAgentConfig};
/// use seo_frontier::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.user_agent_string())
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A [`CrawlClient`] that fetches pages directly over HTTP
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx HTML | Parsed success |
/// | HTTP 2xx non-HTML | Immediate failure result |
/// | HTTP 429, 5xx | Retry up to `max_retries` times, then failure result |
/// | Other HTTP 4xx | Immediate failure result |
/// | Timeout, connection error | Retry, then `Err(FetchError)` |
#[derive(Debug, Clone)]
pub struct HttpCrawlClient {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpCrawlClient {
    /// Creates a client from the user agent and HTTP settings
    pub fn new(user_agent: &UserAgentConfig, http: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, http)?,
            max_retries: http.max_retries,
            base_delay: Duration::from_millis(http.retry_base_delay_ms),
        })
    }

    /// Delay before retry number `attempt + 1`
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_SHIFT))
    }

    async fn read_response(&self, requested_url: &str, response: Response) -> CrawlResult {
        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return CrawlResult::failure(
                final_url.as_str(),
                format!("HTTP {}", status.as_u16()),
                Some(status.as_u16()),
            );
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return CrawlResult::failure(
                final_url.as_str(),
                format!("Unsupported content type: {}", content_type),
                Some(status.as_u16()),
            );
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return CrawlResult::failure(
                    requested_url,
                    format!("Failed to read body: {}", e),
                    Some(status.as_u16()),
                )
            }
        };

        build_result(&final_url, status, &body)
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type.to_ascii_lowercase();
    mime.contains("text/html") || mime.contains("application/xhtml+xml")
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn build_result(final_url: &Url, status: StatusCode, body: &str) -> CrawlResult {
    let parsed = parse_html(body, final_url);

    let mut metadata = serde_json::Map::new();
    let fields = [
        ("title", parsed.title),
        ("h1", parsed.h1),
        ("description", parsed.meta_description),
        ("canonical", parsed.canonical),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            metadata.insert(key.to_string(), Value::String(value));
        }
    }

    CrawlResult {
        success: true,
        url: final_url.to_string(),
        markdown: Some(parsed.body_text),
        links: parsed
            .links
            .into_iter()
            .map(|href| CrawlLink { href })
            .collect(),
        metadata,
        error: None,
        status_code: Some(status.as_u16()),
    }
}

#[async_trait]
impl CrawlClient for HttpCrawlClient {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<CrawlResult, FetchError> {
        let mut attempt = 0;

        loop {
            let mut request = self.client.get(url);
            if let Some(timeout) = options.timeout {
                request = request.timeout(timeout);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && attempt < self.max_retries {
                        let delay = self.backoff(attempt);
                        tracing::debug!(
                            url,
                            status = status.as_u16(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying after HTTP error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(self.read_response(url, response).await);
                }
                Err(e) => {
                    if is_retryable_error(&e) && attempt < self.max_retries {
                        let delay = self.backoff(attempt);
                        tracing::debug!(url, error = %e, attempt, "Retrying after transport error");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(classify_error(url, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(max_retries: u32) -> HttpCrawlClient {
        let http = HttpConfig {
            timeout_secs: 5,
            connect_timeout_secs: 2,
            max_retries,
            retry_base_delay_ms: 1,
        };
        HttpCrawlClient::new(&UserAgentConfig::default(), &http).unwrap()
    }

    fn html_page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_backoff_doubles() {
        let client = test_client(3);
        assert_eq!(client.backoff(0), Duration::from_millis(1));
        assert_eq!(client.backoff(1), Duration::from_millis(2));
        assert_eq!(client.backoff(3), Duration::from_millis(8));
        assert_eq!(client.backoff(40), Duration::from_millis(1024));
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(
                r#"<html><head><title>Home</title></head>
                <body><h1>Welcome</h1><p>Hello there</p><a href="/about">About</a></body></html>"#,
            ))
            .mount(&server)
            .await;

        let result = test_client(0)
            .fetch(&format!("{}/", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.title(), Some("Home"));
        assert_eq!(result.h1(), Some("Welcome"));
        assert_eq!(result.markdown.as_deref(), Some("Welcome\nHello there\nAbout"));
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].href, format!("{}/about", server.uri()));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(3)
            .fetch(&format!("{}/missing", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.status_code, Some(404));
        assert_eq!(result.error.as_deref(), Some("HTTP 404"));
    }

    #[tokio::test]
    async fn test_server_error_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(html_page("<html><body>ok</body></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(3)
            .fetch(&format!("{}/flaky", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert!(result.success);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let result = test_client(2)
            .fetch(&format!("{}/down", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.status_code, Some(500));
    }

    #[tokio::test]
    async fn test_non_html_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let result = test_client(0)
            .fetch(&format!("{}/doc.pdf", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("application/pdf"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        // Nothing listens on port 9 of localhost in test environments
        let result = test_client(0)
            .fetch("http://127.0.0.1:9/", &FetchOptions::default())
            .await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }
}
