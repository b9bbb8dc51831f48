//! Include/exclude URL filtering
//!
//! A [`PatternMatcher`] holds two ordered lists of glob patterns that are
//! tested against the path component of a URL. Exclusion always takes
//! precedence over inclusion.

use crate::crawler::Priority;
use crate::PatternError;
use glob::{MatchOptions, Pattern};
use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

/// Maximum number of `**` sequences allowed in one pattern
pub const MAX_DOUBLE_WILDCARDS: usize = 5;

/// fnmatch rules: case-sensitive, wildcards cross `/`
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Outcome of [`PatternMatcher::should_crawl`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlDecision {
    /// Rejected by the given exclude pattern
    Excluded(String),
    /// Accepted by the given include pattern
    Included(String),
    /// Accepted because no include patterns are configured
    IncludedNoPatterns,
    /// Rejected because include patterns exist and none matched
    NotMatched,
}

impl CrawlDecision {
    /// Returns true if the URL should be crawled
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Included(_) | Self::IncludedNoPatterns)
    }
}

impl fmt::Display for CrawlDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded(pattern) => write!(f, "excluded by pattern: {}", pattern),
            Self::Included(pattern) => write!(f, "included by pattern: {}", pattern),
            Self::IncludedNoPatterns => write!(f, "included (no patterns)"),
            Self::NotMatched => write!(f, "not matched by any include pattern"),
        }
    }
}

/// Glob-based include/exclude URL filter
///
/// Patterns are matched with shell-glob semantics against the
/// percent-decoded URL path, so `*` also matches `/`.
///
/// # Examples
///
/// ```
/// use seo_frontier::url::PatternMatcher;
///
/// let matcher = PatternMatcher::new(
///     vec!["/admin/special".to_string()],
///     vec!["/admin/*".to_string()],
/// )
/// .unwrap();
///
/// // Exclusion always wins
/// assert!(!matcher.should_crawl("https://ex.com/admin/special").is_allowed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    include: Vec<UrlPattern>,
    exclude: Vec<UrlPattern>,
}

/// A compiled pattern alongside the text it was written as
#[derive(Debug, Clone)]
struct UrlPattern {
    source: String,
    glob: Pattern,
}

impl UrlPattern {
    fn compile(source: &str) -> Result<Self, PatternError> {
        if source.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let count = source.matches("**").count();
        if count > MAX_DOUBLE_WILDCARDS {
            return Err(PatternError::TooManyWildcards {
                pattern: source.to_string(),
                count,
                max: MAX_DOUBLE_WILDCARDS,
            });
        }

        let glob = Pattern::new(&collapse_stars(source)).map_err(|e| PatternError::Invalid {
            pattern: source.to_string(),
            message: e.msg.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            glob,
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.glob.matches_with(path, MATCH_OPTIONS)
    }
}

impl PatternMatcher {
    /// Builds a matcher, validating every pattern
    ///
    /// # Errors
    ///
    /// * `PatternError::Empty` - A pattern is empty or whitespace-only
    /// * `PatternError::TooManyWildcards` - A pattern has more than
    ///   [`MAX_DOUBLE_WILDCARDS`] occurrences of `**`
    /// * `PatternError::Invalid` - A pattern is not valid glob syntax,
    ///   such as an unterminated `[`
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Result<Self, PatternError> {
        Ok(Self {
            include: compile_all(&include)?,
            exclude: compile_all(&exclude)?,
        })
    }

    /// Returns true if any include patterns are configured
    pub fn has_include_patterns(&self) -> bool {
        !self.include.is_empty()
    }

    /// Tests the URL against the include patterns
    ///
    /// With no include patterns every URL matches and no pattern is
    /// reported. A malformed URL never matches.
    pub fn matches_include(&self, url: &str) -> (bool, Option<&str>) {
        if self.include.is_empty() {
            return (true, None);
        }
        match url_path(url) {
            Some(path) => first_match(&self.include, &path),
            None => (false, None),
        }
    }

    /// Tests the URL against the exclude patterns
    ///
    /// An empty exclude list never excludes.
    pub fn matches_exclude(&self, url: &str) -> (bool, Option<&str>) {
        if self.exclude.is_empty() {
            return (false, None);
        }
        match url_path(url) {
            Some(path) => first_match(&self.exclude, &path),
            None => (false, None),
        }
    }

    /// Decides whether a URL should be crawled
    ///
    /// Exclusion is checked first and wins regardless of include matches.
    pub fn should_crawl(&self, url: &str) -> CrawlDecision {
        if let (true, Some(pattern)) = self.matches_exclude(url) {
            return CrawlDecision::Excluded(pattern.to_string());
        }

        match self.matches_include(url) {
            (true, Some(pattern)) => CrawlDecision::Included(pattern.to_string()),
            (true, None) => CrawlDecision::IncludedNoPatterns,
            (false, _) => CrawlDecision::NotMatched,
        }
    }

    /// Classifies a URL into a frontier priority tier
    pub fn determine_priority(&self, url: &str) -> Priority {
        match self.matches_include(url) {
            (true, Some(_)) => Priority::Include,
            _ => Priority::Other,
        }
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<UrlPattern>, PatternError> {
    patterns.iter().map(|p| UrlPattern::compile(p)).collect()
}

/// Folds runs of `*` into one
///
/// fnmatch treats `**` like `*`, while `glob` only accepts `**` as a whole
/// path component.
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut previous_star = false;
    for c in pattern.chars() {
        if c == '*' && previous_star {
            continue;
        }
        previous_star = c == '*';
        out.push(c);
    }
    out
}

/// Validates a single glob pattern
pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    UrlPattern::compile(pattern).map(|_| ())
}

fn first_match<'a>(patterns: &'a [UrlPattern], path: &str) -> (bool, Option<&'a str>) {
    patterns
        .iter()
        .find(|pattern| pattern.matches(path))
        .map_or((false, None), |pattern| (true, Some(pattern.source.as_str())))
}

/// Extracts the percent-decoded path component of a URL
///
/// Bare absolute paths like `/admin/x` are accepted as well.
fn url_path(url: &str) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) if url.starts_with('/') => {
            Url::parse("http://localhost/").ok()?.join(url).ok()?
        }
        Err(_) => return None,
    };
    Some(percent_decode_str(parsed.path()).decode_utf8_lossy().into_owned())
}
