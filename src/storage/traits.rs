//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::changes::{ChangeSummary, PageSnapshot};
use crate::crawler::CrawlProgress;
use crate::storage::{CrawlRecord, NewPage, PageRecord, UpsertOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Crawl not found: {0}")]
    CrawlNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence used by the crawl loop and change detection
///
/// Pages are unique per `(project_id, normalized_url)`; each crawl records a
/// snapshot of the pages it visited so two crawls can be compared later.
pub trait PageStore {
    // ===== Crawl Management =====

    /// Creates a new crawl in `pending` status
    ///
    /// # Arguments
    ///
    /// * `project_id` - Project being crawled
    /// * `start_url` - Crawl entry point
    /// * `config_hash` - Hash of the configuration file, if any
    ///
    /// # Returns
    ///
    /// The ID of the newly created crawl
    fn create_crawl(
        &mut self,
        project_id: i64,
        start_url: &str,
        config_hash: Option<&str>,
    ) -> StorageResult<i64>;

    /// Gets a crawl by ID
    fn get_crawl(&self, crawl_id: i64) -> StorageResult<CrawlRecord>;

    /// Persists the status and progress counters of a crawl
    fn update_crawl_status(&mut self, crawl_id: i64, progress: &CrawlProgress)
        -> StorageResult<()>;

    // ===== Page Management =====

    /// Looks up a page by its dedup key
    fn find_page_by_normalized_url(
        &self,
        project_id: i64,
        normalized_url: &str,
    ) -> StorageResult<Option<PageRecord>>;

    /// Inserts a page or updates the existing row for its normalized URL
    ///
    /// Content fields are only rewritten when the content hash changed.
    fn upsert_page(&mut self, page: &NewPage<'_>) -> StorageResult<UpsertOutcome>;

    /// Counts the pages stored for a project
    fn count_pages(&self, project_id: i64) -> StorageResult<usize>;

    // ===== Snapshots and Changes =====

    /// Records that a crawl visited a page, capturing its current hash
    fn record_crawl_page(&mut self, crawl_id: i64, page_id: i64, depth: u32)
        -> StorageResult<()>;

    /// Loads the page snapshots recorded by a crawl, in visit order
    fn load_snapshots(&self, crawl_id: i64) -> StorageResult<Vec<PageSnapshot>>;

    /// Stores a comparison between two crawls
    ///
    /// # Returns
    ///
    /// The ID of the stored summary
    fn save_change_summary(
        &mut self,
        project_id: i64,
        previous_crawl_id: i64,
        current_crawl_id: i64,
        summary: &ChangeSummary,
    ) -> StorageResult<i64>;
}
