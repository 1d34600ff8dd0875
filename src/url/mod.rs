//! URL handling module for Sumi-Harvest
//!
//! This module provides URL normalization, the non-document extension
//! denylist, and the same-host check that keeps a crawl on one site.

mod filter;
mod normalize;

// Re-export main functions
pub use filter::{denied_extension, is_same_host, NON_HTML_EXTENSIONS};
pub use normalize::{normalize_parsed, normalize_url, robots_url};
