//! Crawl frontier with priority tiers and visited-state dedup
//!
//! The frontier hands out URLs in priority order:
//! - `Include` tier before `Normal` before `Other`
//! - within a tier, shallower URLs first
//! - within the same depth, first-in first-out
//!
//! A normalized URL is accepted at most once per queue lifetime, so a page
//! is never re-crawled within one run.

use crate::url::{normalize_url, PatternMatcher};
use crate::FrontierError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Frontier priority tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Matches a configured include pattern (or is the start URL)
    Include,
    /// Additional seed URLs
    Normal,
    /// Everything else that passed filtering
    Other,
}

impl Priority {
    /// Lower rank is popped first
    fn rank(self) -> u8 {
        match self {
            Self::Include => 0,
            Self::Normal => 1,
            Self::Other => 2,
        }
    }
}

/// A URL queued for crawling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedUrl {
    /// The URL as discovered
    pub url: String,

    /// Dedup key
    pub normalized_url: String,

    /// Page the URL was discovered on
    pub parent_url: Option<String>,

    /// Link distance from the start URL
    pub depth: u32,

    pub priority: Priority,

    pub added_at: DateTime<Utc>,
}

/// Heap entry ordering queued URLs by tier, depth, then insertion order
#[derive(Debug)]
struct FrontierEntry {
    sequence: u64,
    item: QueuedUrl,
}

impl FrontierEntry {
    fn key(&self) -> (u8, u32, u64) {
        (self.item.priority.rank(), self.item.depth, self.sequence)
    }
}

// BinaryHeap is a max-heap, so the comparison is reversed to pop the
// smallest (rank, depth, sequence) key first
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FrontierEntry {}

/// Priority-ordered crawl frontier
pub struct UrlPriorityQueue {
    matcher: PatternMatcher,
    frontier: BinaryHeap<FrontierEntry>,
    /// Normalized URLs ever accepted (queued or popped)
    seen: HashSet<String>,
    next_sequence: u64,
    total_added: usize,
    total_popped: usize,
}

impl UrlPriorityQueue {
    /// Creates a frontier seeded with the start URL
    ///
    /// The start URL is queued at depth 0 with `Include` priority and is
    /// exempt from pattern filtering.
    ///
    /// # Errors
    ///
    /// * `FrontierError::Pattern` - An include/exclude pattern is invalid
    /// * `FrontierError::InvalidStartUrl` - The start URL cannot be normalized
    pub fn new(
        start_url: &str,
        include_patterns: Vec<String>,
        exclude_patterns: Vec<String>,
    ) -> Result<Self, FrontierError> {
        let matcher = PatternMatcher::new(include_patterns, exclude_patterns)?;
        let normalized = normalize_url(start_url)?;

        let mut queue = Self {
            matcher,
            frontier: BinaryHeap::new(),
            seen: HashSet::new(),
            next_sequence: 0,
            total_added: 0,
            total_popped: 0,
        };
        queue.push(start_url, normalized.into(), None, 0, Priority::Include);

        Ok(queue)
    }

    /// Adds a discovered URL to the frontier
    ///
    /// Returns false, leaving the queue untouched, if the URL cannot be
    /// normalized, was already accepted, or is rejected by the patterns.
    pub fn add(&mut self, url: &str, parent_url: Option<&str>, depth: u32) -> bool {
        let normalized = match normalize_url(url) {
            Ok(n) => String::from(n),
            Err(e) => {
                tracing::trace!(url, error = %e, "Rejecting unparseable URL");
                return false;
            }
        };

        if self.seen.contains(&normalized) {
            return false;
        }

        let decision = self.matcher.should_crawl(url);
        if !decision.is_allowed() {
            tracing::trace!(url, reason = %decision, "Rejecting filtered URL");
            return false;
        }

        let priority = self.matcher.determine_priority(url);
        self.push(url, normalized, parent_url, depth, priority);
        true
    }

    /// Adds an extra depth-0 seed with `Normal` priority
    ///
    /// Seeds bypass pattern filtering but are still deduplicated.
    pub fn add_seed(&mut self, url: &str) -> bool {
        let normalized = match normalize_url(url) {
            Ok(n) => String::from(n),
            Err(_) => return false,
        };

        if self.seen.contains(&normalized) {
            return false;
        }

        self.push(url, normalized, None, 0, Priority::Normal);
        true
    }

    /// Removes and returns the next URL to crawl
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        let entry = self.frontier.pop()?;
        self.total_popped += 1;
        Some(entry.item)
    }

    /// Returns true if no URLs are waiting
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Number of URLs waiting to be popped
    pub fn len(&self) -> usize {
        self.frontier.len()
    }

    /// Number of URLs ever accepted, including the start URL
    pub fn total_added(&self) -> usize {
        self.total_added
    }

    pub fn total_popped(&self) -> usize {
        self.total_popped
    }

    /// Number of distinct normalized URLs accepted so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if the normalized form of `url` was already accepted
    pub fn has_seen(&self, url: &str) -> bool {
        normalize_url(url)
            .map(|n| self.seen.contains(n.as_str()))
            .unwrap_or(false)
    }

    /// Records a URL as seen without queueing it
    ///
    /// Used for redirect targets so later links to them are rejected.
    /// Returns true if the URL was not seen before.
    pub fn mark_seen(&mut self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(n) => self.seen.insert(String::from(n)),
            Err(_) => false,
        }
    }

    /// The matcher used to filter added URLs
    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    fn push(
        &mut self,
        url: &str,
        normalized_url: String,
        parent_url: Option<&str>,
        depth: u32,
        priority: Priority,
    ) {
        self.seen.insert(normalized_url.clone());

        let item = QueuedUrl {
            url: url.to_string(),
            normalized_url,
            parent_url: parent_url.map(str::to_string),
            depth,
            priority,
            added_at: Utc::now(),
        };

        self.frontier.push(FrontierEntry {
            sequence: self.next_sequence,
            item,
        });
        self.next_sequence += 1;
        self.total_added += 1;
    }
}
