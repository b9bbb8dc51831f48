use serde::Deserialize;

/// Main configuration structure for seo-frontier
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub output: OutputConfig,
    #[serde(rename = "change-detection", default)]
    pub change_detection: ChangeDetectionConfig,
    #[serde(default)]
    pub quality: QualityConfig,
}

/// Crawl job configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Project the crawled pages belong to
    #[serde(rename = "project-id")]
    pub project_id: i64,

    /// Page the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Additional depth-0 URLs crawled after include-tier pages
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Glob patterns matched against URL paths
    #[serde(rename = "include-patterns", default)]
    pub include_patterns: Vec<String>,

    #[serde(rename = "exclude-patterns", default)]
    pub exclude_patterns: Vec<String>,

    /// Stop after this many successfully crawled pages
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link distance from the start URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Follow links leaving the start URL's site
    #[serde(rename = "follow-external", default)]
    pub follow_external: bool,

    /// Concurrent requests for batch fetches
    #[serde(rename = "batch-concurrency", default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_max_pages() -> usize {
    100
}

fn default_max_depth() -> u32 {
    3
}

fn default_batch_concurrency() -> usize {
    5
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SeoFrontier".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/crawler".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// HTTP client behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Extra attempts after the first for retryable failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled on each further attempt
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Change detection thresholds and fingerprint settings
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeDetectionConfig {
    /// New pages at or above this count make a change significant
    #[serde(rename = "new-page-threshold", default = "default_new_page_threshold")]
    pub new_page_threshold: usize,

    /// Changed fraction at or above this makes a change significant
    #[serde(
        rename = "change-percentage-threshold",
        default = "default_change_percentage_threshold"
    )]
    pub change_percentage_threshold: f64,

    /// Body characters included in the content fingerprint
    #[serde(rename = "max-content-length", default = "default_max_content_length")]
    pub max_content_length: usize,

    #[serde(rename = "normalize-whitespace", default = "default_true")]
    pub normalize_whitespace: bool,
}

fn default_new_page_threshold() -> usize {
    5
}

fn default_change_percentage_threshold() -> f64 {
    0.10
}

fn default_max_content_length() -> usize {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for ChangeDetectionConfig {
    fn default() -> Self {
        Self {
            new_page_threshold: default_new_page_threshold(),
            change_percentage_threshold: default_change_percentage_threshold(),
            max_content_length: default_max_content_length(),
            normalize_whitespace: true,
        }
    }
}

/// Content quality checker settings
#[derive(Debug, Clone, Deserialize)]
pub struct QualityConfig {
    /// Uses of each limited-use word allowed before penalties apply
    #[serde(
        rename = "max-limited-use-words-per-page",
        default = "default_max_limited_use"
    )]
    pub max_limited_use_words_per_page: usize,

    /// Words banned in addition to the built-in list
    #[serde(rename = "extra-banned-words", default)]
    pub extra_banned_words: Vec<String>,

    /// Phrases banned in addition to the built-in list
    #[serde(rename = "extra-banned-phrases", default)]
    pub extra_banned_phrases: Vec<String>,
}

fn default_max_limited_use() -> usize {
    1
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_limited_use_words_per_page: default_max_limited_use(),
            extra_banned_words: Vec::new(),
            extra_banned_phrases: Vec::new(),
        }
    }
}
