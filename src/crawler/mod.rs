//! Crawler module for the crawl frontier and crawl loop
//!
//! This module contains the core crawling logic, including:
//! - The priority frontier with visited-state dedup
//! - The crawl client contract and its HTTP implementation
//! - HTML parsing and link extraction
//! - Crawl progress, its state machine and broadcasting
//! - Overall crawl coordination and bounded batch fetching

mod batch;
mod client;
mod coordinator;
mod fetcher;
mod parser;
mod progress;
mod queue;
mod sink;

pub use batch::{fetch_batch, BatchFetchOutcome};
pub use client::{CrawlClient, CrawlLink, CrawlResult, FetchError, FetchOptions};
pub use coordinator::{CrawlJob, CrawlService};
pub use fetcher::{build_http_client, HttpCrawlClient};
pub use parser::{parse_html, resolve_link, ParsedPage};
pub use progress::{CrawlErrorRecord, CrawlProgress, CrawlStatus};
pub use queue::{Priority, QueuedUrl, UrlPriorityQueue};
pub use sink::{BroadcastProgressSink, ProgressMessage, ProgressSink, SinkError};
