//! Integration tests for seo-frontier

mod analysis_tests;
mod crawl_tests;
mod frontier_tests;
