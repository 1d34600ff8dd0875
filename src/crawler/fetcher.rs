//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (timeout, redirects, Accept header)
//! - GET requests with the caller's User-Agent
//! - Retry with exponential backoff for transient failures
//! - Error classification into status-coded outcomes

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Accept header sent with every request
pub const ACCEPT_HEADER: &str = "text/html,*/*;q=0.8";

/// Default total timeout for one request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Maximum redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
///
/// Every failure mode is folded into a value: `status` carries either the
/// real HTTP status or a synthetic one (408 timeout, 503 connection error,
/// 500 unclassified) and `error` holds a human-readable message.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// HTTP status code (real or synthetic)
    pub status: u16,

    /// Response body, empty for failures
    pub body: String,

    /// Response headers, empty when no response was received
    pub headers: HeaderMap,

    /// Failure description, `None` on success
    pub error: Option<String>,

    /// Number of attempts made, at least 1
    pub attempts: u32,
}

impl FetchOutcome {
    /// Returns true for a 2xx response that was read completely
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }

    /// Content-Type header value, empty when absent or not valid ASCII
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Returns true if the Content-Type declares an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type().to_ascii_lowercase().contains("text/html")
    }

    /// Failure message, or an empty string on success
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

/// Retry classification of a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchClass {
    /// 2xx
    Success,
    /// 5xx, 429 and 408: worth another attempt
    Transient,
    /// Everything else (other 4xx, unfollowed 3xx)
    Permanent,
}

/// Classifies a response status for retry purposes
///
/// | Status | Class |
/// |--------|-------|
/// | 2xx | Success |
/// | 5xx | Transient |
/// | 429, 408 | Transient |
/// | other 4xx, 3xx | Permanent |
pub fn classify_status(status: StatusCode) -> FetchClass {
    if status.is_success() {
        FetchClass::Success
    } else if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        FetchClass::Transient
    } else {
        FetchClass::Permanent
    }
}

/// Bounded retry schedule with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retry_limit: u32,

    /// Delay before the first retry; doubles for each further retry
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub fn new(retry_limit: u32, backoff_base_ms: u64) -> Self {
        Self {
            retry_limit,
            backoff_base_ms,
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.retry_limit.saturating_add(1)
    }

    /// Delay slept after failed attempt number `attempt` (0-based)
    ///
    /// `backoff_base_ms × 2^attempt`, saturating at `u64::MAX` milliseconds.
    ///
    /// ```
    /// use std::time::Duration;
    /// use sumi_harvest::crawler::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(3, 300);
    /// assert_eq!(policy.delay_for(0), Duration::from_millis(300));
    /// assert_eq!(policy.delay_for(2), Duration::from_millis(1200));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Builds an HTTP client with proper configuration
///
/// The User-Agent is set per request so one client can serve crawls with
/// different identities.
///
/// # Arguments
///
/// * `timeout` - Total timeout per request (connect, headers and body)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// One failed attempt
#[derive(Debug)]
struct AttemptFailure {
    status: u16,
    message: String,
    headers: HeaderMap,
    transient: bool,
}

impl AttemptFailure {
    fn new(status: u16, message: String, transient: bool) -> Self {
        Self {
            status,
            message,
            headers: HeaderMap::new(),
            transient,
        }
    }
}

/// Maps a transport-level error onto a synthetic status
///
/// | Condition | Status | Retried |
/// |-----------|--------|---------|
/// | Timeout | 408 | yes |
/// | Connection failure | 503 | yes |
/// | Body/decode/request failure | 503 | yes |
/// | Redirect loop or chain > 10 | 500 | no |
/// | Invalid request (e.g. bad header) | 500 | no |
/// | Anything else | 500 | yes |
fn classify_error(error: reqwest::Error) -> AttemptFailure {
    if error.is_timeout() {
        AttemptFailure::new(408, "Request Timeout".to_string(), true)
    } else if error.is_connect() {
        AttemptFailure::new(503, format!("Client Connection Error: {}", error), true)
    } else if error.is_redirect() {
        AttemptFailure::new(500, format!("Redirect Error: {}", error), false)
    } else if error.is_builder() {
        AttemptFailure::new(500, format!("Invalid Request: {}", error), false)
    } else if error.is_body() || error.is_decode() || error.is_request() {
        AttemptFailure::new(503, format!("Client Error: {}", error), true)
    } else {
        AttemptFailure::new(500, format!("Generic Fetch Error: {}", error), true)
    }
}

/// HTTP fetcher shared by every unit of a crawl
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with its own client
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(timeout)?))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL with retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return body |
    /// | 5xx, 429, 408 | Retry, sleeping `backoff_base_ms × 2^attempt` |
    /// | Timeout, connection error | Retry, same schedule |
    /// | Other 4xx | Return immediately |
    ///
    /// Never fails: exhausted retries and permanent failures come back as a
    /// [`FetchOutcome`] with `error` set.
    pub async fn fetch(&self, url: &str, user_agent: &str, policy: RetryPolicy) -> FetchOutcome {
        let mut attempt: u32 = 0;

        loop {
            let failure = match self.attempt(url, user_agent).await {
                Ok((status, headers, body)) => {
                    return FetchOutcome {
                        status,
                        body,
                        headers,
                        error: None,
                        attempts: attempt + 1,
                    };
                }
                Err(failure) => failure,
            };

            let attempts = attempt + 1;

            if !failure.transient {
                tracing::debug!("Permanent failure for {}: {}", url, failure.message);
                return FetchOutcome {
                    status: failure.status,
                    body: String::new(),
                    headers: failure.headers,
                    error: Some(format!("{} (for {})", failure.message, url)),
                    attempts,
                };
            }

            if attempt >= policy.retry_limit {
                tracing::debug!(
                    "All {} attempts failed for {}. Last error: {}",
                    attempts,
                    url,
                    failure.message
                );
                return FetchOutcome {
                    status: failure.status,
                    body: String::new(),
                    headers: failure.headers,
                    error: Some(format!(
                        "{} (after {} attempts for {})",
                        failure.message, attempts, url
                    )),
                    attempts,
                };
            }

            let delay = policy.delay_for(attempt);
            tracing::debug!(
                "Attempt {} failed for {}: {}. Retrying in {:?}",
                attempts,
                url,
                failure.message,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Performs a single GET and reads the body of successful responses
    async fn attempt(
        &self,
        url: &str,
        user_agent: &str,
    ) -> Result<(u16, HeaderMap, String), AttemptFailure> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        let headers = response.headers().clone();

        match classify_status(status) {
            FetchClass::Success => {
                let body = response.text().await.map_err(classify_error)?;
                Ok((status.as_u16(), headers, body))
            }
            class => Err(AttemptFailure {
                status: status.as_u16(),
                message: format!(
                    "HTTP Error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status")
                ),
                headers,
                transient: class == FetchClass::Transient,
            }),
        }
    }
}
