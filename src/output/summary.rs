//! Crawl summary generation
//!
//! Condenses a [`CrawlResult`] into counts that are easy to print or log.

use crate::crawler::CrawlResult;
use std::collections::BTreeMap;

/// Broad category of an error-ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// Disallowed by robots.txt
    Robots,
    /// Rejected for its file extension
    Extension,
    /// Fetched but not an HTML document
    NotHtml,
    /// HTTP status or transport failure
    Fetch,
    /// The unit processing the URL broke
    Processing,
    /// Invalid root URL or client setup failure
    Configuration,
    Other,
}

impl ErrorKind {
    /// Classifies an error-ledger message
    pub fn classify(message: &str) -> Self {
        if message.starts_with("Skipped by robots.txt") {
            Self::Robots
        } else if message.starts_with("Skipped due to file extension") {
            Self::Extension
        } else if message.starts_with("Skipped: Not HTML") {
            Self::NotHtml
        } else if message.starts_with("HTTP Error") {
            Self::Fetch
        } else if message.starts_with("Processing Error") {
            Self::Processing
        } else if message.starts_with("Invalid root_url") || message.starts_with("Failed to build")
        {
            Self::Configuration
        } else {
            Self::Other
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Number of stored HTML pages
    pub pages_fetched: usize,

    /// Sum of stored body sizes in bytes
    pub total_bytes: u64,

    /// Wall-clock duration in milliseconds
    pub elapsed_ms: i64,

    /// Error-ledger entries per category
    pub errors_by_kind: BTreeMap<ErrorKind, usize>,

    /// Total error-ledger entries
    pub total_errors: usize,
}

impl CrawlStatistics {
    /// Computes statistics for a finished crawl
    pub fn from_result(result: &CrawlResult) -> Self {
        let mut errors_by_kind = BTreeMap::new();
        for message in result.errors().values() {
            *errors_by_kind
                .entry(ErrorKind::classify(message))
                .or_insert(0) += 1;
        }

        Self {
            pages_fetched: result.pages_fetched(),
            total_bytes: result.total_bytes(),
            elapsed_ms: result.elapsed_ms(),
            errors_by_kind,
            total_errors: result.errors().len(),
        }
    }

    /// Share of attempted URLs that produced a stored page, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_fetched + self.total_errors;
        if attempted == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / attempted as f64) * 100.0
        }
    }
}

/// Prints a crawl summary to stdout
///
/// # Arguments
///
/// * `result` - The finished crawl
/// * `list_pages` - Whether to list every fetched URL and error
pub fn print_summary(result: &CrawlResult, list_pages: bool) {
    let stats = CrawlStatistics::from_result(result);

    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Total bytes: {}", stats.total_bytes);
    println!("  Elapsed: {:.2}s", stats.elapsed_ms as f64 / 1000.0);
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.errors_by_kind.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in error_counts {
            println!("  {:?}: {}", kind, count);
        }
        println!();
    }

    if list_pages {
        if !result.html_contents().is_empty() {
            println!("Pages ({}):", result.pages_fetched());
            for (url, body) in result.html_contents() {
                println!("  - {} ({} bytes)", url, body.len());
            }
            println!();
        }

        if !result.errors().is_empty() {
            println!("Errors ({}):", result.errors().len());
            for (url, message) in result.errors() {
                println!("  - {}: {}", url, message);
            }
            println!();
        }
    }

    println!(
        "Success Rate: {:.1}% ({} / {} URLs stored)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.pages_fetched + stats.total_errors
    );
}
