//! Configuration module for seo-frontier
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Settings are loaded once by the binary and passed to each service explicitly.
//!
//! # Example
//!
//! ```no_run
//! use seo_frontier::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawl starts at: {}", config.crawler.start_url);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    ChangeDetectionConfig, Config, CrawlerConfig, HttpConfig, OutputConfig, QualityConfig,
    UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
