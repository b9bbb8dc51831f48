//! Crawl run status and progress counters

use crate::SeoError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl CrawlStatus {
    /// Converts to database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses from database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for statuses a run never leaves
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Legal moves are `pending -> running`, `pending -> failed|cancelled`
    /// and `running -> completed|failed|cancelled`.
    pub fn can_transition_to(&self, next: CrawlStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A per-page failure recorded during a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlErrorRecord {
    pub url: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Counters and status of one crawl run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlProgress {
    pub crawl_id: i64,
    pub project_id: i64,
    pub status: CrawlStatus,
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub pages_skipped: usize,
    /// URLs still waiting in the frontier
    pub queue_size: usize,
    pub current_url: Option<String>,
    pub errors: Vec<CrawlErrorRecord>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CrawlProgress {
    /// Creates progress for a run that has not started
    pub fn new(crawl_id: i64, project_id: i64) -> Self {
        Self {
            crawl_id,
            project_id,
            status: CrawlStatus::Pending,
            pages_crawled: 0,
            pages_failed: 0,
            pages_skipped: 0,
            queue_size: 0,
            current_url: None,
            errors: Vec::new(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Moves to a new status, stamping start and completion times
    ///
    /// # Errors
    ///
    /// Returns `SeoError::InvalidTransition` if the move is not legal; the
    /// progress is left unchanged.
    pub fn transition(&mut self, next: CrawlStatus) -> Result<(), SeoError> {
        if !self.status.can_transition_to(next) {
            return Err(SeoError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        if next == CrawlStatus::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        self.status = next;
        Ok(())
    }

    /// Pages that reached a crawled or failed outcome
    pub fn pages_processed(&self) -> usize {
        self.pages_crawled + self.pages_failed
    }

    /// Records a per-page failure
    pub fn record_failure(&mut self, url: &str, error: impl Into<String>) {
        self.pages_failed += 1;
        self.errors.push(CrawlErrorRecord {
            url: url.to_string(),
            error: error.into(),
            timestamp: Utc::now(),
        });
    }
}
