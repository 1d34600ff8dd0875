//! Robots.txt rule evaluation using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt ruleset for one host
///
/// Built once per crawl and shared read-only between all units. Only
/// `User-agent`, `Allow` and `Disallow` are honoured.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content
    content: String,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Checks if a URL may be fetched by the given user agent
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The full User-Agent string; its product token is matched
    /// * `url` - The absolute URL to check
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn can_fetch(&self, user_agent: &str, url: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        // The matcher keeps per-query state, so build a fresh one per check
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }
}

/// Extracts the product token robots.txt groups are matched against
///
/// `"DocBot/2.0 (+https://example.com/bot)"` becomes `"DocBot"`. Only
/// letters, `-` and `_` are kept, matching how robots.txt user-agent lines
/// are interpreted.
pub fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphabetic() || *c == '-' || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}
