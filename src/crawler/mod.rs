//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML link extraction
//! - The frontier of pending work
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod result;

pub use coordinator::{Coordinator, CrawlOptions};
pub use fetcher::{
    build_http_client, classify_status, FetchClass, FetchOutcome, Fetcher, RetryPolicy,
    ACCEPT_HEADER, DEFAULT_REQUEST_TIMEOUT,
};
pub use frontier::{CrawlTask, Frontier, Rejection};
pub use parser::{extract_links, ExtractedLinks, SkippedLink};
pub use result::CrawlResult;

use crate::output::ProgressObserver;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate and normalize the root URL
/// 2. Load robots.txt for the root's host
/// 3. Fetch pages concurrently up to `options.max_depth` link hops away
/// 4. Collect every HTML body and every per-URL failure
///
/// # Arguments
///
/// * `root_url` - Absolute http(s) URL to start from
/// * `options` - Crawl tunables
/// * `observer` - Optional receiver for progress events
///
/// # Returns
///
/// Always a [`CrawlResult`]. Failures, including an invalid root URL or an
/// HTTP client that cannot be built, end up in its error ledger.
pub async fn crawl(
    root_url: &str,
    options: CrawlOptions,
    observer: Option<Arc<dyn ProgressObserver>>,
) -> CrawlResult {
    match Coordinator::new(options, observer) {
        Ok(coordinator) => coordinator.run(root_url).await,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            let mut result = CrawlResult::start();
            result.record_error(root_url, format!("Failed to build HTTP client: {}", e));
            result.finish()
        }
    }
}
