//! Storage module for persisting crawl data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Crawl status and progress persistence
//! - Page upserts keyed by normalized URL
//! - Per-crawl page snapshots and stored change summaries

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PageStore, StorageError, StorageResult};

use crate::crawler::CrawlStatus;

/// Represents a crawl in the database
#[derive(Debug, Clone)]
pub struct CrawlRecord {
    pub id: i64,
    pub project_id: i64,
    pub start_url: String,
    pub config_hash: Option<String>,
    pub status: CrawlStatus,
    /// Last persisted progress, as JSON
    pub progress: Option<serde_json::Value>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

/// Represents a page in the database
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i64,
    pub project_id: i64,
    pub url: String,
    pub normalized_url: String,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub meta_description: Option<String>,
    pub content: Option<String>,
    pub content_hash: String,
    pub status_code: Option<u16>,
    pub first_seen_at: String,
    pub last_crawled_at: String,
}

/// Page fields written by [`PageStore::upsert_page`]
#[derive(Debug, Clone, Copy)]
pub struct NewPage<'a> {
    pub project_id: i64,
    pub url: &'a str,
    pub normalized_url: &'a str,
    pub title: Option<&'a str>,
    pub h1: Option<&'a str>,
    pub meta_description: Option<&'a str>,
    pub content: Option<&'a str>,
    pub content_hash: &'a str,
    pub status_code: Option<u16>,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub page_id: i64,
    /// No row existed for the normalized URL
    pub created: bool,
    /// The stored content hash differs from the previous one
    pub content_changed: bool,
}
