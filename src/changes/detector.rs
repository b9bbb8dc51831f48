//! Crawl-to-crawl change detection

use crate::config::ChangeDetectionConfig;
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum URLs listed per category in a [`ChangeSummary`]
pub const MAX_URLS_IN_SUMMARY: usize = 100;

pub const DEFAULT_NEW_PAGE_THRESHOLD: usize = 5;
pub const DEFAULT_CHANGE_PERCENTAGE_THRESHOLD: f64 = 0.10;

/// A page as recorded by one crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub content_hash: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page_id: Option<i64>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, content_hash: Option<&str>) -> Self {
        Self {
            url: url.into(),
            content_hash: content_hash.map(str::to_string),
            title: None,
            page_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    New,
    Removed,
    Changed,
    Unchanged,
}

/// Classification of one URL across two crawls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageChange {
    pub url: String,
    pub change_type: ChangeType,
    pub previous_hash: Option<String>,
    pub current_hash: Option<String>,
}

/// Aggregate differences between two crawls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub new_pages: usize,
    pub removed_pages: usize,
    pub changed_pages: usize,
    pub unchanged_pages: usize,
    /// Distinct URLs in the previous crawl
    pub total_previous: usize,
    /// Distinct URLs in the current crawl
    pub total_current: usize,
    pub new_urls: Vec<String>,
    pub removed_urls: Vec<String>,
    pub changed_urls: Vec<String>,
    /// `changed / (changed + unchanged)`, 0.0 when both are zero
    pub change_percentage: f64,
    pub is_significant: bool,
}

/// Compares page sets from two crawls
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDetector {
    new_page_threshold: usize,
    change_percentage_threshold: f64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self {
            new_page_threshold: DEFAULT_NEW_PAGE_THRESHOLD,
            change_percentage_threshold: DEFAULT_CHANGE_PERCENTAGE_THRESHOLD,
        }
    }
}

impl ChangeDetector {
    /// Creates a detector with the given significance thresholds
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::OutOfRange` if `change_percentage_threshold`
    /// is outside `[0.0, 1.0]` or NaN.
    pub fn new(
        new_page_threshold: usize,
        change_percentage_threshold: f64,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&change_percentage_threshold) {
            return Err(ValidationError::OutOfRange {
                field: "change_percentage_threshold",
                value: change_percentage_threshold,
                min: 0.0,
                max: 1.0,
            });
        }

        Ok(Self {
            new_page_threshold,
            change_percentage_threshold,
        })
    }

    pub fn from_config(config: &ChangeDetectionConfig) -> Result<Self, ValidationError> {
        Self::new(config.new_page_threshold, config.change_percentage_threshold)
    }

    /// Classifies every distinct URL of both crawls exactly once
    ///
    /// Current URLs come first in their first-seen order, followed by removed
    /// URLs in previous order. A URL repeated within one side takes the hash
    /// of its last occurrence.
    pub fn classify(&self, previous: &[PageSnapshot], current: &[PageSnapshot]) -> Vec<PageChange> {
        let (previous_order, previous_hashes) = index_by_url(previous);
        let (current_order, current_hashes) = index_by_url(current);

        let mut changes = Vec::with_capacity(previous_order.len() + current_order.len());

        for url in current_order {
            let current_hash = current_hashes[url];
            let change = match previous_hashes.get(url) {
                None => PageChange {
                    url: url.to_string(),
                    change_type: ChangeType::New,
                    previous_hash: None,
                    current_hash: current_hash.map(str::to_string),
                },
                Some(&previous_hash) => PageChange {
                    url: url.to_string(),
                    change_type: if previous_hash == current_hash {
                        ChangeType::Unchanged
                    } else {
                        ChangeType::Changed
                    },
                    previous_hash: previous_hash.map(str::to_string),
                    current_hash: current_hash.map(str::to_string),
                },
            };
            changes.push(change);
        }

        for url in previous_order {
            if !current_hashes.contains_key(url) {
                changes.push(PageChange {
                    url: url.to_string(),
                    change_type: ChangeType::Removed,
                    previous_hash: previous_hashes[url].map(str::to_string),
                    current_hash: None,
                });
            }
        }

        changes
    }

    /// Summarizes the differences between two crawls
    pub fn compare(&self, previous: &[PageSnapshot], current: &[PageSnapshot]) -> ChangeSummary {
        let changes = self.classify(previous, current);

        let mut summary = ChangeSummary {
            new_pages: 0,
            removed_pages: 0,
            changed_pages: 0,
            unchanged_pages: 0,
            total_previous: 0,
            total_current: 0,
            new_urls: Vec::new(),
            removed_urls: Vec::new(),
            changed_urls: Vec::new(),
            change_percentage: 0.0,
            is_significant: false,
        };

        for change in changes {
            let (count, urls) = match change.change_type {
                ChangeType::New => (&mut summary.new_pages, Some(&mut summary.new_urls)),
                ChangeType::Removed => (&mut summary.removed_pages, Some(&mut summary.removed_urls)),
                ChangeType::Changed => (&mut summary.changed_pages, Some(&mut summary.changed_urls)),
                ChangeType::Unchanged => (&mut summary.unchanged_pages, None),
            };
            *count += 1;
            if let Some(urls) = urls {
                if urls.len() < MAX_URLS_IN_SUMMARY {
                    urls.push(change.url);
                }
            }
        }

        summary.total_previous = summary.removed_pages + summary.changed_pages + summary.unchanged_pages;
        summary.total_current = summary.new_pages + summary.changed_pages + summary.unchanged_pages;

        let compared = summary.changed_pages + summary.unchanged_pages;
        summary.change_percentage = if compared == 0 {
            0.0
        } else {
            summary.changed_pages as f64 / compared as f64
        };

        summary.is_significant = summary.new_pages >= self.new_page_threshold
            || summary.change_percentage >= self.change_percentage_threshold;

        tracing::debug!(
            new = summary.new_pages,
            removed = summary.removed_pages,
            changed = summary.changed_pages,
            unchanged = summary.unchanged_pages,
            significant = summary.is_significant,
            "Compared crawls"
        );

        summary
    }
}

/// Builds the URL order and a last-write-wins URL to hash map
fn index_by_url(pages: &[PageSnapshot]) -> (Vec<&str>, HashMap<&str, Option<&str>>) {
    let mut order = Vec::new();
    let mut hashes = HashMap::new();

    for page in pages {
        let hash = page.content_hash.as_deref();
        if hashes.insert(page.url.as_str(), hash).is_none() {
            order.push(page.url.as_str());
        }
    }

    (order, hashes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn snap(url: &str, hash: Option<&str>) -> PageSnapshot {
        PageSnapshot::new(url, hash)
    }

    #[test]
    fn test_unchanged_compare() {
        let previous = vec![snap("u1", Some("h1"))];
        let current = vec![snap("u1", Some("h1"))];
        let summary = ChangeDetector::default().compare(&previous, &current);

        assert_eq!(summary.unchanged_pages, 1);
        assert!(!summary.is_significant);
        assert_eq!(summary.change_percentage, 0.0);
    }

    #[test]
    fn test_classification_rules() {
        let previous = vec![
            snap("same", Some("a")),
            snap("edited", Some("b")),
            snap("gone", Some("c")),
            snap("both-none", None),
            snap("lost-hash", Some("d")),
        ];
        let current = vec![
            snap("same", Some("a")),
            snap("edited", Some("B")),
            snap("fresh", Some("e")),
            snap("both-none", None),
            snap("lost-hash", None),
        ];

        let changes = ChangeDetector::default().classify(&previous, &current);
        let kinds: Vec<(&str, ChangeType)> = changes
            .iter()
            .map(|c| (c.url.as_str(), c.change_type))
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("same", ChangeType::Unchanged),
                ("edited", ChangeType::Changed),
                ("fresh", ChangeType::New),
                ("both-none", ChangeType::Unchanged),
                ("lost-hash", ChangeType::Changed),
                ("gone", ChangeType::Removed),
            ]
        );
    }

    #[test]
    fn test_partition_covers_union() {
        let previous = vec![snap("a", Some("1")), snap("b", Some("2")), snap("a", Some("3"))];
        let current = vec![snap("b", Some("2")), snap("c", None), snap("c", Some("4"))];

        let changes = ChangeDetector::default().classify(&previous, &current);
        let urls: HashSet<&str> = changes.iter().map(|c| c.url.as_str()).collect();

        assert_eq!(changes.len(), 3);
        assert_eq!(urls, HashSet::from(["a", "b", "c"]));

        let summary = ChangeDetector::default().compare(&previous, &current);
        assert_eq!(
            summary.new_pages + summary.removed_pages + summary.changed_pages + summary.unchanged_pages,
            3
        );
        assert_eq!(summary.total_previous, 2);
        assert_eq!(summary.total_current, 2);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let previous = vec![snap("u", Some("old")), snap("u", Some("new"))];
        let current = vec![snap("u", Some("new"))];
        let summary = ChangeDetector::default().compare(&previous, &current);
        assert_eq!(summary.unchanged_pages, 1);
        assert_eq!(summary.changed_pages, 0);
    }

    #[test]
    fn test_significance_by_new_pages() {
        let current: Vec<PageSnapshot> = (0..5)
            .map(|i| snap(&format!("new-{}", i), Some("h")))
            .collect();
        let summary = ChangeDetector::default().compare(&[], &current);
        assert_eq!(summary.new_pages, 5);
        assert_eq!(summary.change_percentage, 0.0);
        assert!(summary.is_significant);

        let summary = ChangeDetector::default().compare(&[], &current[..4]);
        assert!(!summary.is_significant);
    }

    #[test]
    fn test_significance_by_change_percentage() {
        let mut previous: Vec<PageSnapshot> =
            (0..10).map(|i| snap(&format!("p{}", i), Some("h"))).collect();
        let current = previous.clone();
        previous[0].content_hash = Some("other".to_string());

        let summary = ChangeDetector::default().compare(&previous, &current);
        assert_eq!(summary.changed_pages, 1);
        assert!((summary.change_percentage - 0.1).abs() < f64::EPSILON);
        assert!(summary.is_significant);
    }

    #[test]
    fn test_url_lists_capped() {
        let current: Vec<PageSnapshot> = (0..150)
            .map(|i| snap(&format!("n{}", i), None))
            .collect();
        let summary = ChangeDetector::default().compare(&[], &current);
        assert_eq!(summary.new_pages, 150);
        assert_eq!(summary.new_urls.len(), MAX_URLS_IN_SUMMARY);
        assert_eq!(summary.new_urls[0], "n0");
    }

    #[test]
    fn test_threshold_validation() {
        assert!(ChangeDetector::new(0, 0.0).is_ok());
        assert!(ChangeDetector::new(3, 1.0).is_ok());
        assert!(matches!(
            ChangeDetector::new(5, 1.01),
            Err(ValidationError::OutOfRange { field: "change_percentage_threshold", .. })
        ));
        assert!(ChangeDetector::new(5, -0.1).is_err());
        assert!(ChangeDetector::new(5, f64::NAN).is_err());
    }
}
