//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the seo-frontier database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS crawls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    start_url TEXT NOT NULL,
    config_hash TEXT,
    status TEXT NOT NULL,
    progress TEXT,
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_crawls_project ON crawls(project_id);

-- One row per distinct page of a project
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    url TEXT NOT NULL,
    normalized_url TEXT NOT NULL,
    title TEXT,
    h1 TEXT,
    meta_description TEXT,
    content TEXT,
    content_hash TEXT NOT NULL,
    status_code INTEGER,
    first_seen_at TEXT NOT NULL,
    last_crawled_at TEXT NOT NULL,
    UNIQUE(project_id, normalized_url)
);

CREATE INDEX IF NOT EXISTS idx_pages_project ON pages(project_id);

-- Pages visited by each crawl, with the hash seen at the time
CREATE TABLE IF NOT EXISTS crawl_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    page_id INTEGER NOT NULL REFERENCES pages(id),
    url TEXT NOT NULL,
    title TEXT,
    content_hash TEXT,
    depth INTEGER NOT NULL,
    crawled_at TEXT NOT NULL,
    UNIQUE(crawl_id, page_id)
);

CREATE INDEX IF NOT EXISTS idx_crawl_pages_crawl ON crawl_pages(crawl_id);

-- Stored comparisons between two crawls
CREATE TABLE IF NOT EXISTS change_summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    previous_crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    current_crawl_id INTEGER NOT NULL REFERENCES crawls(id),
    summary TEXT NOT NULL,
    is_significant INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
