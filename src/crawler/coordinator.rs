//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the frontier, the crawl
//! client and storage together:
//! - Seeding the frontier and creating the crawl record
//! - Fetching pages in priority order within page and depth limits
//! - Fingerprinting and upserting crawled pages
//! - Filtering and enqueueing discovered links
//! - Persisting and broadcasting progress

use crate::changes::{ContentHasher, HashFields};
use crate::config::CrawlerConfig;
use crate::crawler::client::{CrawlClient, CrawlResult, FetchOptions};
use crate::crawler::parser::resolve_link;
use crate::crawler::progress::{CrawlProgress, CrawlStatus};
use crate::crawler::queue::{QueuedUrl, UrlPriorityQueue};
use crate::crawler::sink::ProgressSink;
use crate::storage::{NewPage, PageStore};
use crate::url::{is_same_site, normalize_url};
use crate::SeoError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Progress is persisted and broadcast every this many processed pages
const PROGRESS_INTERVAL: usize = 10;

/// Parameters of a single crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlJob {
    pub project_id: i64,
    pub start_url: String,
    pub seeds: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_pages: usize,
    pub max_depth: u32,
    pub follow_external: bool,
    pub config_hash: Option<String>,
}

impl CrawlJob {
    /// Creates a job with no patterns, no extra seeds and default limits
    pub fn new(project_id: i64, start_url: impl Into<String>) -> Self {
        Self {
            project_id,
            start_url: start_url.into(),
            seeds: Vec::new(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_pages: 100,
            max_depth: 3,
            follow_external: false,
            config_hash: None,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            project_id: config.project_id,
            start_url: config.start_url.clone(),
            seeds: config.seeds.clone(),
            include_patterns: config.include_patterns.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
            max_pages: config.max_pages,
            max_depth: config.max_depth,
            follow_external: config.follow_external,
            config_hash: None,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }
}

/// Runs crawls against an injected client and store
pub struct CrawlService<C, S> {
    client: C,
    storage: S,
    hasher: ContentHasher,
    sink: Option<Arc<dyn ProgressSink>>,
    fetch_options: FetchOptions,
}

impl<C: CrawlClient, S: PageStore> CrawlService<C, S> {
    pub fn new(client: C, storage: S, hasher: ContentHasher) -> Self {
        Self {
            client,
            storage,
            hasher,
            sink: None,
            fetch_options: FetchOptions::default(),
        }
    }

    /// Broadcasts progress through `sink` while crawling
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs a complete crawl
    ///
    /// The frontier is built before anything is written, so invalid patterns
    /// or an invalid start URL fail without creating a crawl. Once the crawl
    /// is running, per-page failures are recorded in the progress and never
    /// stop the loop. A storage error ends the crawl as `Failed`.
    ///
    /// # Arguments
    ///
    /// * `job` - What to crawl and within which limits
    /// * `cancel` - Checked once per page; cancellation ends the crawl as `Cancelled`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlProgress)` - Final progress, in a terminal status
    /// * `Err(SeoError)` - The crawl could not be set up or its final state
    ///   could not be saved
    pub async fn run_crawl(
        &mut self,
        job: &CrawlJob,
        cancel: &CancellationToken,
    ) -> Result<CrawlProgress, SeoError> {
        let start = normalize_url(&job.start_url)?;
        let mut queue = UrlPriorityQueue::new(
            &job.start_url,
            job.include_patterns.clone(),
            job.exclude_patterns.clone(),
        )?;
        for seed in &job.seeds {
            if !queue.add_seed(seed) {
                tracing::debug!(seed = %seed, "Ignoring duplicate or invalid seed");
            }
        }

        let crawl_id =
            self.storage
                .create_crawl(job.project_id, &job.start_url, job.config_hash.as_deref())?;
        let mut progress = CrawlProgress::new(crawl_id, job.project_id);
        progress.transition(CrawlStatus::Running)?;
        progress.queue_size = queue.len();

        tracing::info!(
            crawl_id,
            project_id = job.project_id,
            start_url = %job.start_url,
            max_pages = job.max_pages,
            max_depth = job.max_depth,
            "Starting crawl"
        );
        self.report(&progress)?;

        let outcome = self
            .crawl_loop(job, &start, &mut queue, &mut progress, cancel)
            .await;
        progress.current_url = None;
        progress.queue_size = queue.len();

        match outcome {
            Ok(status) => {
                progress.transition(status)?;
                self.report(&progress)?;
            }
            Err(e) => {
                tracing::error!(crawl_id, error = %e, "Crawl failed");
                progress.transition(CrawlStatus::Failed)?;
                if let Err(save_error) = self.report(&progress) {
                    tracing::error!(crawl_id, error = %save_error, "Failed to save final crawl status");
                }
            }
        }

        tracing::info!(
            crawl_id,
            status = %progress.status,
            pages_crawled = progress.pages_crawled,
            pages_failed = progress.pages_failed,
            pages_skipped = progress.pages_skipped,
            "Crawl finished"
        );

        Ok(progress)
    }

    /// Returns the terminal status to finish with
    async fn crawl_loop(
        &mut self,
        job: &CrawlJob,
        start: &Url,
        queue: &mut UrlPriorityQueue,
        progress: &mut CrawlProgress,
        cancel: &CancellationToken,
    ) -> Result<CrawlStatus, SeoError> {
        // Normalized final URLs stored during this run
        let mut stored: HashSet<String> = HashSet::new();

        while progress.pages_crawled < job.max_pages {
            if cancel.is_cancelled() {
                tracing::info!(crawl_id = progress.crawl_id, "Crawl cancelled");
                return Ok(CrawlStatus::Cancelled);
            }

            let Some(next) = queue.pop() else {
                tracing::info!(crawl_id = progress.crawl_id, "Frontier is empty");
                break;
            };
            progress.queue_size = queue.len();

            if stored.contains(&next.normalized_url) {
                tracing::debug!(url = %next.url, "Already stored under a redirect");
                continue;
            }

            if next.depth > job.max_depth {
                tracing::debug!(url = %next.url, depth = next.depth, "Skipping URL beyond max depth");
                progress.pages_skipped += 1;
                continue;
            }

            progress.current_url = Some(next.url.clone());
            tracing::debug!(url = %next.url, depth = next.depth, priority = ?next.priority, "Fetching");

            match self.client.fetch(&next.url, &self.fetch_options).await {
                Ok(result) if result.success => {
                    let final_url = final_normalized_url(&next, &result);
                    queue.mark_seen(&final_url);
                    if !stored.insert(final_url.clone()) {
                        tracing::debug!(url = %next.url, final_url = %final_url, "Redirect target already stored");
                        continue;
                    }
                    self.store_page(job, &next, &result, &final_url, progress)?;
                    self.enqueue_links(job, start, &next, &result, queue);
                    progress.queue_size = queue.len();
                }
                Ok(result) => {
                    let error = result
                        .error
                        .unwrap_or_else(|| "Crawl returned no content".to_string());
                    tracing::warn!(url = %next.url, error = %error, "Page failed");
                    progress.record_failure(&next.url, error);
                }
                Err(e) => {
                    tracing::warn!(url = %next.url, error = %e, "Fetch failed");
                    progress.record_failure(&next.url, e.to_string());
                }
            }

            if progress.pages_processed() % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    crawl_id = progress.crawl_id,
                    pages_crawled = progress.pages_crawled,
                    pages_failed = progress.pages_failed,
                    queue_size = progress.queue_size,
                    "Progress"
                );
                self.report(progress)?;
            }
        }

        Ok(CrawlStatus::Completed)
    }

    fn store_page(
        &mut self,
        job: &CrawlJob,
        queued: &QueuedUrl,
        result: &CrawlResult,
        normalized: &str,
        progress: &mut CrawlProgress,
    ) -> Result<(), SeoError> {
        let page_url = page_url(queued, result);

        let content_hash = self.hasher.compute_hash(&HashFields {
            title: result.title(),
            h1: result.h1(),
            meta_description: result.meta_description(),
            body_text: result.markdown.as_deref(),
        });

        let outcome = self.storage.upsert_page(&NewPage {
            project_id: job.project_id,
            url: page_url,
            normalized_url: normalized,
            title: result.title(),
            h1: result.h1(),
            meta_description: result.meta_description(),
            content: result.markdown.as_deref(),
            content_hash: &content_hash,
            status_code: result.status_code,
        })?;
        self.storage
            .record_crawl_page(progress.crawl_id, outcome.page_id, queued.depth)?;
        progress.pages_crawled += 1;

        tracing::debug!(
            url = %page_url,
            page_id = outcome.page_id,
            created = outcome.created,
            content_changed = outcome.content_changed,
            "Stored page"
        );
        Ok(())
    }

    /// Resolves, filters and enqueues the links of a crawled page
    fn enqueue_links(
        &self,
        job: &CrawlJob,
        start: &Url,
        queued: &QueuedUrl,
        result: &CrawlResult,
        queue: &mut UrlPriorityQueue,
    ) {
        let page_url = page_url(queued, result);
        let Ok(base) = Url::parse(page_url).or_else(|_| Url::parse(&queued.url)) else {
            return;
        };

        let mut added = 0;
        for link in &result.links {
            let Some(absolute) = resolve_link(&link.href, &base) else {
                continue;
            };
            let Ok(parsed) = Url::parse(&absolute) else {
                continue;
            };

            if !job.follow_external && !is_same_site(&parsed, start) {
                tracing::trace!(url = %absolute, "Skipping external link");
                continue;
            }

            let decision = queue.matcher().should_crawl(&absolute);
            if !decision.is_allowed() {
                tracing::debug!(url = %absolute, reason = %decision, "Link filtered");
                continue;
            }

            if queue.add(&absolute, Some(page_url), queued.depth + 1) {
                added += 1;
            }
        }

        tracing::debug!(url = %page_url, found = result.links.len(), added, "Links processed");
    }

    /// Persists progress and broadcasts it to the sink
    ///
    /// Broadcast failures are logged and otherwise ignored.
    fn report(&mut self, progress: &CrawlProgress) -> Result<(), SeoError> {
        self.storage
            .update_crawl_status(progress.crawl_id, progress)?;

        let Some(sink) = &self.sink else {
            return Ok(());
        };
        let payload = match serde_json::to_value(progress) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(crawl_id = progress.crawl_id, error = %e, "Failed to encode progress");
                return Ok(());
            }
        };
        if let Err(e) = sink.broadcast(progress.project_id, progress.crawl_id, &payload) {
            tracing::warn!(crawl_id = progress.crawl_id, error = %e, "Progress broadcast failed");
        }
        Ok(())
    }
}

/// URL a result was served from, falling back to the queued URL
fn page_url<'a>(queued: &'a QueuedUrl, result: &'a CrawlResult) -> &'a str {
    if result.url.trim().is_empty() {
        &queued.url
    } else {
        &result.url
    }
}

/// Normalized form of the URL a fetch ended on, after redirects
fn final_normalized_url(queued: &QueuedUrl, result: &CrawlResult) -> String {
    normalize_url(page_url(queued, result))
        .map(String::from)
        .unwrap_or_else(|_| queued.normalized_url.clone())
}
