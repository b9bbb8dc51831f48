//! Content fingerprinting and crawl-to-crawl change detection

mod detector;
mod hasher;

pub use detector::{
    ChangeDetector, ChangeSummary, ChangeType, PageChange, PageSnapshot,
    DEFAULT_CHANGE_PERCENTAGE_THRESHOLD, DEFAULT_NEW_PAGE_THRESHOLD, MAX_URLS_IN_SUMMARY,
};
pub use hasher::{ContentHasher, HashFields, DEFAULT_MAX_CONTENT_LENGTH};
