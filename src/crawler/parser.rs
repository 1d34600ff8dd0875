//! HTML link extraction
//!
//! Turns a fetched page into the same-host candidate URLs the coordinator
//! may enqueue, plus the same-host links that were rejected for pointing at
//! a non-document file.

use crate::url::{denied_extension, is_same_host, normalize_parsed};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Schemes that never lead to a crawlable page
const IGNORED_PREFIXES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// A same-host link rejected before dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    /// Normalized absolute URL
    pub url: Url,

    /// Why the link was rejected
    pub reason: String,
}

/// Links extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Normalized same-host http(s) URLs, in document order, without duplicates
    pub follow: Vec<Url>,

    /// Same-host links dropped by the extension denylist
    pub skipped: Vec<SkippedLink>,
}

impl ExtractedLinks {
    pub fn is_empty(&self) -> bool {
        self.follow.is_empty() && self.skipped.is_empty()
    }
}

/// Extracts candidate links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags resolved against `source`
///
/// **Exclude:**
/// - Empty hrefs and `mailto:`, `tel:`, `javascript:` targets
/// - Non-HTTP(S) URLs after resolution
/// - Links to a different host than `root`
/// - Paths ending in a non-document extension (reported in `skipped`)
///
/// Fragments are stripped, so `page#a` and `page#b` yield one candidate.
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/guide#top">Guide</a><a href="https://other.org/">Out</a>"#;
/// let root = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &root, &root);
/// assert_eq!(links.follow.len(), 1);
/// assert_eq!(links.follow[0].as_str(), "https://example.com/guide");
/// ```
pub fn extract_links(html: &str, source: &Url, root: &Url) -> ExtractedLinks {
    let document = Html::parse_document(html);
    let mut links = ExtractedLinks::default();
    let mut seen = HashSet::new();

    let a_selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return links,
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(url) = resolve_link(href, source) else {
            continue;
        };

        if !is_same_host(&url, root) {
            continue;
        }

        if !seen.insert(url.as_str().to_string()) {
            continue;
        }

        match denied_extension(&url) {
            Some(_) => {
                let reason = format!("Skipped due to file extension: {}", url.path());
                links.skipped.push(SkippedLink { url, reason });
            }
            None => links.follow.push(url),
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - empty hrefs
/// - javascript:, mailto:, tel: targets
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if IGNORED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_parsed(absolute).ok()
}
