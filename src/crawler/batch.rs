//! Bounded-concurrency batch fetching

use crate::crawler::client::{CrawlClient, CrawlResult, FetchError, FetchOptions};
use futures::stream::{self, Stream, StreamExt};

/// Result of one URL in a batch
#[derive(Debug)]
pub struct BatchFetchOutcome {
    pub url: String,
    pub result: Result<CrawlResult, FetchError>,
}

impl BatchFetchOutcome {
    /// True if the client returned a successful crawl
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(result) if result.success)
    }
}

/// Fetches `urls` with at most `concurrency` requests in flight
///
/// Outcomes are yielded in completion order. A failed URL produces its own
/// outcome and never affects the others. A concurrency of 0 is treated as 1.
///
/// # Example
///
/// ```no_run
/// use futures::StreamExt;
/// use seo_frontier::config::{HttpConfig, UserAgentConfig};
/// use seo_frontier::crawler::{fetch_batch, FetchOptions, HttpCrawlClient};
///
/// # async fn run() -> Result<(), reqwest::Error> {
/// let client = HttpCrawlClient::new(&UserAgentConfig::default(), &HttpConfig::default())?;
/// let urls = vec!["https://example.com/".to_string()];
/// let options = FetchOptions::default();
/// let mut outcomes = fetch_batch(&client, urls, 5, &options);
/// while let Some(outcome) = outcomes.next().await {
///     println!("{}: {}", outcome.url, outcome.is_success());
/// }
/// # Ok(())
/// # }
/// ```
pub fn fetch_batch<'a, C>(
    client: &'a C,
    urls: Vec<String>,
    concurrency: usize,
    options: &'a FetchOptions,
) -> impl Stream<Item = BatchFetchOutcome> + 'a
where
    C: CrawlClient + ?Sized,
{
    stream::iter(urls)
        .map(move |url| async move {
            let result = client.fetch(&url, options).await;
            if let Err(e) = &result {
                tracing::warn!(url = %url, error = %e, "Batch fetch failed");
            }
            BatchFetchOutcome { url, result }
        })
        .buffer_unordered(concurrency.max(1))
}
