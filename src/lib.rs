//! seo-frontier: crawl frontier and content analysis for SEO operations
//!
//! This crate implements the algorithmic core of an SEO content backend:
//! a pattern-filtered, priority-ordered crawl frontier with its crawl loop,
//! content fingerprinting and change detection, related-collection matching,
//! and an AI-trope content quality detector.

pub mod changes;
pub mod config;
pub mod crawler;
pub mod quality;
pub mod related;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for seo-frontier operations
#[derive(Debug, Error)]
pub enum SeoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("Frontier error: {0}")]
    Frontier(#[from] FrontierError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid crawl status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crawler::CrawlStatus,
        to: crawler::CrawlStatus,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(#[from] PatternError),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Glob pattern validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Pattern cannot be empty")]
    Empty,

    #[error("Pattern '{pattern}' contains {count} '**' wildcards (max {max})")]
    TooManyWildcards {
        pattern: String,
        count: usize,
        max: usize,
    },

    #[error("Invalid pattern '{pattern}': {message}")]
    Invalid { pattern: String, message: String },
}

/// Input validation errors, raised before any side effect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Errors raised while building a crawl frontier
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(#[from] UrlError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Result type alias for seo-frontier operations
pub type Result<T> = std::result::Result<T, SeoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use changes::{ChangeDetector, ChangeSummary, ContentHasher, PageSnapshot};
pub use config::Config;
pub use crawler::{CrawlProgress, CrawlService, CrawlStatus, Priority, QueuedUrl, UrlPriorityQueue};
pub use quality::{ContentInput, ContentQualityService, TropeDetectionResult};
pub use related::{Collection, RelatedCollectionsService};
pub use url::{normalize_url, CrawlDecision, PatternMatcher};
