//! Crawl result aggregation
//!
//! [`CrawlResult`] is owned by exactly one coordinator run. The coordinator
//! mutates it through the crate-private `record_*` methods, which keep the
//! page map and the error ledger disjoint, and hands it back by value once
//! the crawl is finished.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Terminal output of one crawl invocation
#[derive(Debug, Clone)]
pub struct CrawlResult {
    html_contents: BTreeMap<String, String>,
    errors: BTreeMap<String, String>,
    total_bytes: u64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl CrawlResult {
    /// Creates an empty result stamped with the current time
    pub(crate) fn start() -> Self {
        let now = Utc::now();
        Self {
            html_contents: BTreeMap::new(),
            errors: BTreeMap::new(),
            total_bytes: 0,
            start_time: now,
            end_time: now,
        }
    }

    /// Stores a fetched HTML body and returns its UTF-8 byte length
    pub(crate) fn record_page(&mut self, url: &str, body: String) -> usize {
        let bytes = body.len();
        self.errors.remove(url);
        if let Some(previous) = self.html_contents.insert(url.to_string(), body) {
            self.total_bytes = self.total_bytes.saturating_sub(previous.len() as u64);
        }
        self.total_bytes += bytes as u64;
        bytes
    }

    /// Records an error or skip reason for a URL
    ///
    /// Ignored when the URL already has a stored page.
    pub(crate) fn record_error(&mut self, url: &str, message: impl Into<String>) {
        if self.html_contents.contains_key(url) {
            tracing::debug!("Ignoring error for already fetched {}", url);
            return;
        }
        self.errors.insert(url.to_string(), message.into());
    }

    /// Stamps the end of the crawl
    pub(crate) fn finish(mut self) -> Self {
        self.end_time = Utc::now();
        self
    }

    /// Fetched HTML bodies keyed by normalized URL, in URL order
    pub fn html_contents(&self) -> &BTreeMap<String, String> {
        &self.html_contents
    }

    /// Error and skip messages keyed by URL, in URL order
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Sum of the UTF-8 byte lengths of all stored bodies
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Wall-clock duration of the crawl in milliseconds, never negative
    pub fn elapsed_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds().max(0)
    }

    /// Number of stored pages
    pub fn pages_fetched(&self) -> usize {
        self.html_contents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_page_counts_utf8_bytes() {
        let mut result = CrawlResult::start();
        let bytes = result.record_page("https://example.com/", "héllo".to_string());
        assert_eq!(bytes, 6);
        assert_eq!(result.total_bytes(), 6);
        assert_eq!(result.pages_fetched(), 1);
    }

    #[test]
    fn test_error_does_not_shadow_page() {
        let mut result = CrawlResult::start();
        result.record_page("https://example.com/", "<html></html>".to_string());
        result.record_error("https://example.com/", "late failure");
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_page_replaces_stale_error() {
        let mut result = CrawlResult::start();
        result.record_error("https://example.com/a", "HTTP Error: 503");
        result.record_page("https://example.com/a", "ok".to_string());
        assert!(result.errors().is_empty());
        assert_eq!(result.html_contents().len(), 1);
    }

    #[test]
    fn test_rerecording_page_keeps_byte_total_consistent() {
        let mut result = CrawlResult::start();
        result.record_page("https://example.com/a", "12345".to_string());
        result.record_page("https://example.com/a", "12".to_string());
        assert_eq!(result.total_bytes(), 2);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let result = CrawlResult::start().finish();
        assert!(result.elapsed_ms() >= 0);
        assert!(result.end_time() >= result.start_time());
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut result = CrawlResult::start();
        result.record_page("https://example.com/b", String::new());
        result.record_page("https://example.com/a", String::new());
        let keys: Vec<_> = result.html_contents().keys().cloned().collect();
        assert_eq!(keys, vec!["https://example.com/a", "https://example.com/b"]);
    }
}
