//! Robots.txt handling module
//!
//! This module fetches robots.txt once per crawl and evaluates its rules.
//! A missing or unreadable robots.txt never stops a crawl; it simply means
//! everything is allowed.

mod parser;

pub use parser::{product_token, RobotsPolicy};

use crate::crawler::{Fetcher, RetryPolicy};
use crate::url::robots_url;
use url::Url;

/// Outcome of loading robots.txt for a host
#[derive(Debug, Clone)]
pub enum RobotsLookup {
    /// robots.txt was fetched and parsed
    Parsed { policy: RobotsPolicy, source: String },

    /// No usable robots.txt; everything is allowed
    Absent { reason: String },
}

impl RobotsLookup {
    /// Returns the policy, or `None` when everything is allowed
    pub fn into_policy(self) -> Option<RobotsPolicy> {
        match self {
            Self::Parsed { policy, .. } => Some(policy),
            Self::Absent { .. } => None,
        }
    }

    /// Human-readable description of the lookup
    pub fn describe(&self) -> String {
        match self {
            Self::Parsed { source, .. } => format!("Successfully parsed robots.txt from {}", source),
            Self::Absent { reason } => reason.clone(),
        }
    }
}

/// Fetches and parses robots.txt for the host serving `root`
///
/// Issues a single attempt (no retries) to `<scheme>://<host>/robots.txt`.
/// Any non-200 status, fetch failure or empty body yields
/// [`RobotsLookup::Absent`].
///
/// # Arguments
///
/// * `fetcher` - The crawl's fetcher
/// * `root` - Any URL on the target host, usually the crawl root
/// * `user_agent` - The user agent string to send
pub async fn load_policy(fetcher: &Fetcher, root: &Url, user_agent: &str) -> RobotsLookup {
    let robots_url = robots_url(root);
    tracing::debug!("Fetching robots.txt from {}", robots_url);

    let outcome = fetcher
        .fetch(robots_url.as_str(), user_agent, RetryPolicy::none())
        .await;

    if let Some(error) = &outcome.error {
        return RobotsLookup::Absent {
            reason: format!(
                "Could not fetch robots.txt (status {}) from {}: {}",
                outcome.status, robots_url, error
            ),
        };
    }

    if outcome.status != 200 || outcome.body.trim().is_empty() {
        return RobotsLookup::Absent {
            reason: format!(
                "Could not fetch robots.txt (status {}) from {}",
                outcome.status, robots_url
            ),
        };
    }

    RobotsLookup::Parsed {
        policy: RobotsPolicy::from_content(&outcome.body),
        source: robots_url.to_string(),
    }
}
