//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PageStore trait.

use crate::changes::{ChangeSummary, PageSnapshot};
use crate::crawler::{CrawlProgress, CrawlStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use crate::storage::{CrawlRecord, NewPage, PageRecord, UpsertOutcome};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PAGE_COLUMNS: &str = "id, project_id, url, normalized_url, title, h1, meta_description,
     content, content_hash, status_code, first_seen_at, last_crawled_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Lists crawl IDs of a project, newest first
    pub fn list_crawls(&self, project_id: i64) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM crawls WHERE project_id = ?1 ORDER BY id DESC")?;
        let ids = stmt
            .query_map(params![project_id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        url: row.get(2)?,
        normalized_url: row.get(3)?,
        title: row.get(4)?,
        h1: row.get(5)?,
        meta_description: row.get(6)?,
        content: row.get(7)?,
        content_hash: row.get(8)?,
        status_code: row.get(9)?,
        first_seen_at: row.get(10)?,
        last_crawled_at: row.get(11)?,
    })
}

impl PageStore for SqliteStorage {
    // ===== Crawl Management =====

    fn create_crawl(
        &mut self,
        project_id: i64,
        start_url: &str,
        config_hash: Option<&str>,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawls (project_id, start_url, config_hash, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project_id,
                start_url,
                config_hash,
                CrawlStatus::Pending.to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_crawl(&self, crawl_id: i64) -> StorageResult<CrawlRecord> {
        let row = self
            .conn
            .query_row(
                "SELECT id, project_id, start_url, config_hash, status, progress, created_at,
                 started_at, completed_at FROM crawls WHERE id = ?1",
                params![crawl_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, Option<String>>(8)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            id,
            project_id,
            start_url,
            config_hash,
            status,
            progress,
            created_at,
            started_at,
            completed_at,
        )) = row
        else {
            return Err(StorageError::CrawlNotFound(crawl_id));
        };

        let status = CrawlStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::InvalidData(format!("Unknown crawl status: {}", status)))?;
        let progress = progress
            .map(|json| serde_json::from_str(&json))
            .transpose()?;

        Ok(CrawlRecord {
            id,
            project_id,
            start_url,
            config_hash,
            status,
            progress,
            created_at,
            started_at,
            completed_at,
        })
    }

    fn update_crawl_status(
        &mut self,
        crawl_id: i64,
        progress: &CrawlProgress,
    ) -> StorageResult<()> {
        let progress_json = serde_json::to_string(progress)?;
        let updated = self.conn.execute(
            "UPDATE crawls SET status = ?1, progress = ?2, started_at = ?3, completed_at = ?4
             WHERE id = ?5",
            params![
                progress.status.to_db_string(),
                progress_json,
                progress.started_at.map(|t| t.to_rfc3339()),
                progress.completed_at.map(|t| t.to_rfc3339()),
                crawl_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::CrawlNotFound(crawl_id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn find_page_by_normalized_url(
        &self,
        project_id: i64,
        normalized_url: &str,
    ) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE project_id = ?1 AND normalized_url = ?2",
                    PAGE_COLUMNS
                ),
                params![project_id, normalized_url],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn upsert_page(&mut self, page: &NewPage<'_>) -> StorageResult<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();
        let existing = self.find_page_by_normalized_url(page.project_id, page.normalized_url)?;

        match existing {
            Some(stored) if stored.content_hash == page.content_hash => {
                self.conn.execute(
                    "UPDATE pages SET url = ?1, status_code = ?2, last_crawled_at = ?3 WHERE id = ?4",
                    params![page.url, page.status_code, now, stored.id],
                )?;
                Ok(UpsertOutcome {
                    page_id: stored.id,
                    created: false,
                    content_changed: false,
                })
            }
            Some(stored) => {
                self.conn.execute(
                    "UPDATE pages SET url = ?1, title = ?2, h1 = ?3, meta_description = ?4,
                     content = ?5, content_hash = ?6, status_code = ?7, last_crawled_at = ?8
                     WHERE id = ?9",
                    params![
                        page.url,
                        page.title,
                        page.h1,
                        page.meta_description,
                        page.content,
                        page.content_hash,
                        page.status_code,
                        now,
                        stored.id
                    ],
                )?;
                Ok(UpsertOutcome {
                    page_id: stored.id,
                    created: false,
                    content_changed: true,
                })
            }
            None => {
                self.conn.execute(
                    "INSERT INTO pages (project_id, url, normalized_url, title, h1,
                     meta_description, content, content_hash, status_code, first_seen_at,
                     last_crawled_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                    params![
                        page.project_id,
                        page.url,
                        page.normalized_url,
                        page.title,
                        page.h1,
                        page.meta_description,
                        page.content,
                        page.content_hash,
                        page.status_code,
                        now
                    ],
                )?;
                Ok(UpsertOutcome {
                    page_id: self.conn.last_insert_rowid(),
                    created: true,
                    content_changed: true,
                })
            }
        }
    }

    fn count_pages(&self, project_id: i64) -> StorageResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ===== Snapshots and Changes =====

    fn record_crawl_page(&mut self, crawl_id: i64, page_id: i64, depth: u32) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR REPLACE INTO crawl_pages (crawl_id, page_id, url, title, content_hash,
             depth, crawled_at)
             SELECT ?1, id, normalized_url, title, content_hash, ?3, ?4 FROM pages WHERE id = ?2",
            params![crawl_id, page_id, depth, now],
        )?;

        if inserted == 0 {
            return Err(StorageError::PageNotFound(format!("Page ID {}", page_id)));
        }
        Ok(())
    }

    fn load_snapshots(&self, crawl_id: i64) -> StorageResult<Vec<PageSnapshot>> {
        // Ensures an unknown crawl is an error rather than an empty page set
        self.get_crawl(crawl_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT url, content_hash, title, page_id FROM crawl_pages
             WHERE crawl_id = ?1 ORDER BY id",
        )?;

        let snapshots = stmt
            .query_map(params![crawl_id], |row| {
                Ok(PageSnapshot {
                    url: row.get(0)?,
                    content_hash: row.get(1)?,
                    title: row.get(2)?,
                    page_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(snapshots)
    }

    fn save_change_summary(
        &mut self,
        project_id: i64,
        previous_crawl_id: i64,
        current_crawl_id: i64,
        summary: &ChangeSummary,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO change_summaries (project_id, previous_crawl_id, current_crawl_id,
             summary, is_significant, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project_id,
                previous_crawl_id,
                current_crawl_id,
                serde_json::to_string(summary)?,
                summary.is_significant,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeDetector;

    fn new_page<'a>(normalized_url: &'a str, hash: &'a str, title: Option<&'a str>) -> NewPage<'a> {
        NewPage {
            project_id: 1,
            url: normalized_url,
            normalized_url,
            title,
            h1: None,
            meta_description: None,
            content: Some("body"),
            content_hash: hash,
            status_code: Some(200),
        }
    }

    #[test]
    fn test_create_and_get_crawl() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage
            .create_crawl(1, "https://ex.com/", Some("abc"))
            .unwrap();

        let crawl = storage.get_crawl(crawl_id).unwrap();
        assert_eq!(crawl.project_id, 1);
        assert_eq!(crawl.status, CrawlStatus::Pending);
        assert_eq!(crawl.config_hash.as_deref(), Some("abc"));
        assert!(crawl.progress.is_none());
    }

    #[test]
    fn test_get_missing_crawl() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_crawl(99),
            Err(StorageError::CrawlNotFound(99))
        ));
    }

    #[test]
    fn test_update_crawl_status_persists_progress() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(1, "https://ex.com/", None).unwrap();

        let mut progress = CrawlProgress::new(crawl_id, 1);
        progress.transition(CrawlStatus::Running).unwrap();
        progress.pages_crawled = 4;
        storage.update_crawl_status(crawl_id, &progress).unwrap();

        let crawl = storage.get_crawl(crawl_id).unwrap();
        assert_eq!(crawl.status, CrawlStatus::Running);
        assert!(crawl.started_at.is_some());
        assert_eq!(crawl.progress.unwrap()["pages_crawled"], 4);

        let missing = CrawlProgress::new(42, 1);
        assert!(storage.update_crawl_status(42, &missing).is_err());
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let first = storage
            .upsert_page(&new_page("https://ex.com/a", "h1", Some("Old")))
            .unwrap();
        assert!(first.created);

        let same = storage
            .upsert_page(&new_page("https://ex.com/a", "h1", Some("Ignored")))
            .unwrap();
        assert_eq!(same.page_id, first.page_id);
        assert!(!same.created);
        assert!(!same.content_changed);

        let stored = storage
            .find_page_by_normalized_url(1, "https://ex.com/a")
            .unwrap()
            .unwrap();
        assert_eq!(stored.title.as_deref(), Some("Old"));

        let changed = storage
            .upsert_page(&new_page("https://ex.com/a", "h2", Some("New")))
            .unwrap();
        assert_eq!(changed.page_id, first.page_id);
        assert!(changed.content_changed);

        let stored = storage
            .find_page_by_normalized_url(1, "https://ex.com/a")
            .unwrap()
            .unwrap();
        assert_eq!(stored.title.as_deref(), Some("New"));
        assert_eq!(stored.content_hash, "h2");
        assert_eq!(storage.count_pages(1).unwrap(), 1);
    }

    #[test]
    fn test_pages_scoped_by_project() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_page(&new_page("https://ex.com/a", "h", None))
            .unwrap();
        let mut other = new_page("https://ex.com/a", "h", None);
        other.project_id = 2;
        let outcome = storage.upsert_page(&other).unwrap();

        assert!(outcome.created);
        assert_eq!(storage.count_pages(1).unwrap(), 1);
        assert_eq!(storage.count_pages(2).unwrap(), 1);
        assert!(storage
            .find_page_by_normalized_url(3, "https://ex.com/a")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_snapshots_capture_hash_at_crawl_time() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first_crawl = storage.create_crawl(1, "https://ex.com/", None).unwrap();
        let page = storage
            .upsert_page(&new_page("https://ex.com/a", "v1", None))
            .unwrap();
        storage
            .record_crawl_page(first_crawl, page.page_id, 0)
            .unwrap();

        let second_crawl = storage.create_crawl(1, "https://ex.com/", None).unwrap();
        storage
            .upsert_page(&new_page("https://ex.com/a", "v2", None))
            .unwrap();
        storage
            .record_crawl_page(second_crawl, page.page_id, 0)
            .unwrap();

        let previous = storage.load_snapshots(first_crawl).unwrap();
        let current = storage.load_snapshots(second_crawl).unwrap();
        assert_eq!(previous[0].content_hash.as_deref(), Some("v1"));
        assert_eq!(current[0].content_hash.as_deref(), Some("v2"));
        assert_eq!(current[0].page_id, Some(page.page_id));

        let summary = ChangeDetector::default().compare(&previous, &current);
        assert_eq!(summary.changed_pages, 1);

        let id = storage
            .save_change_summary(1, first_crawl, second_crawl, &summary)
            .unwrap();
        assert!(id > 0);
    }

    #[test]
    fn test_record_unknown_page() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let crawl_id = storage.create_crawl(1, "https://ex.com/", None).unwrap();
        assert!(matches!(
            storage.record_crawl_page(crawl_id, 404, 0),
            Err(StorageError::PageNotFound(_))
        ));
    }

    #[test]
    fn test_list_crawls_newest_first() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let a = storage.create_crawl(1, "https://ex.com/", None).unwrap();
        let b = storage.create_crawl(1, "https://ex.com/", None).unwrap();
        storage.create_crawl(2, "https://other.com/", None).unwrap();
        assert_eq!(storage.list_crawls(1).unwrap(), vec![b, a]);
    }

    #[test]
    fn test_file_backed_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seo.db");
        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage.create_crawl(1, "https://ex.com/", None).unwrap();
        }
        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.list_crawls(1).unwrap().len(), 1);
    }
}
