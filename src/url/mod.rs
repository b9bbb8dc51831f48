//! URL handling module
//!
//! This module provides URL normalization, same-site checks and glob-based
//! include/exclude pattern filtering for the crawl frontier.

mod domain;
mod normalize;
mod pattern;

pub use domain::{extract_domain, is_same_site};
pub use normalize::{normalize_url, normalize_url_string};
pub use pattern::{validate_pattern, CrawlDecision, PatternMatcher, MAX_DOUBLE_WILDCARDS};
