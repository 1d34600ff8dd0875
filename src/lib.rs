//! Sumi-Harvest: a polite single-host page harvester
//!
//! This crate fetches a bounded-depth subtree of pages from one host,
//! respecting robots.txt, retrying transient failures with exponential
//! backoff, and returning the raw HTML of every page alongside a per-URL
//! error ledger.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::{crawl, CrawlOptions};
//!
//! # async fn example() {
//! let options = CrawlOptions {
//!     max_depth: 1,
//!     ..CrawlOptions::default()
//! };
//! let result = crawl("https://example.com/docs/", options, None).await;
//! for (url, html) in result.html_contents() {
//!     println!("{} ({} bytes)", url, html.len());
//! }
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
///
/// Per-URL failures never surface here; they are recorded in the
/// [`CrawlResult`] error ledger instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),
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
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlOptions, CrawlResult};
pub use output::ProgressObserver;
pub use url::normalize_url;
