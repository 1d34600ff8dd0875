//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the frontier and the result for the whole run.
//! Fetch-and-expand units run concurrently on the tokio runtime, each
//! holding one concurrency permit, and hand their outcome back by value
//! through a [`JoinSet`]. Only the coordinator's loop ever mutates crawl
//! state, so no locking is needed.

use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, RetryPolicy, DEFAULT_REQUEST_TIMEOUT};
use crate::crawler::frontier::{CrawlTask, Frontier, Rejection};
use crate::crawler::parser::{extract_links, ExtractedLinks};
use crate::crawler::result::CrawlResult;
use crate::output::{FetchProgress, ProgressObserver, Reporter};
use crate::robots::{load_policy, RobotsPolicy};
use crate::url::{denied_extension, normalize_url};
use crate::HarvestError;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Tunables for a single crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Link hops to follow from the root (0 fetches the root only)
    pub max_depth: u32,

    /// User-Agent header value, also matched against robots.txt groups
    pub user_agent: String,

    /// Whether to fetch and obey robots.txt
    pub respect_robots_txt: bool,

    /// Maximum number of fetch-and-expand units in flight
    pub concurrency_limit: usize,

    /// Extra attempts after the first for transient failures
    pub retry_limit: u32,

    /// Base delay for exponential backoff in milliseconds
    pub backoff_base_ms: u64,

    /// Total timeout for a single request
    pub request_timeout: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            user_agent: "SumiHarvest/0.1".to_string(),
            respect_robots_txt: true,
            concurrency_limit: 10,
            retry_limit: 2,
            backoff_base_ms: 500,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl From<&Config> for CrawlOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_depth: config.crawler.max_depth,
            user_agent: config.user_agent.header_value(),
            respect_robots_txt: config.crawler.respect_robots_txt,
            concurrency_limit: config.crawler.concurrency_limit as usize,
            retry_limit: config.crawler.retry_limit,
            backoff_base_ms: config.crawler.backoff_base_ms,
            request_timeout: Duration::from_secs(config.crawler.request_timeout_secs),
        }
    }
}

/// Lifecycle of the coordinator loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrawlPhase {
    /// Work is queued
    Running,
    /// Queue is empty but units are still in flight
    Draining,
    /// Nothing queued and nothing in flight
    Done,
}

impl CrawlPhase {
    fn of(queued: usize, in_flight: usize) -> Self {
        match (queued, in_flight) {
            (0, 0) => Self::Done,
            (0, _) => Self::Draining,
            _ => Self::Running,
        }
    }
}

/// Immutable context shared by every unit of one crawl
struct UnitContext {
    fetcher: Fetcher,
    user_agent: String,
    retry: RetryPolicy,
    max_depth: u32,
    root: Url,
    reporter: Reporter,
}

/// What a unit learned about its URL
#[derive(Debug)]
enum UnitOutcome {
    /// HTML page fetched, with links to consider when below max depth
    Page {
        status: u16,
        body: String,
        links: ExtractedLinks,
    },

    /// Fetch succeeded but the response is not a document
    Skipped { message: String },

    /// Fetch failed or the unit itself broke
    Failed { status: Option<u16>, message: String },
}

/// Message a unit sends back to the coordinator
#[derive(Debug)]
struct UnitReport {
    task: CrawlTask,
    outcome: UnitOutcome,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    options: CrawlOptions,
    fetcher: Fetcher,
    reporter: Reporter,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `options` - Crawl tunables
    /// * `observer` - Optional receiver for progress events
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(
        options: CrawlOptions,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(options.request_timeout)?;
        Ok(Self::with_fetcher(options, fetcher, observer))
    }

    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(
        options: CrawlOptions,
        fetcher: Fetcher,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Self {
        Self {
            options,
            fetcher,
            reporter: Reporter::new(observer),
        }
    }

    /// Runs one crawl rooted at `root_url`
    ///
    /// This is the core crawling logic that:
    /// 1. Validates the root URL
    /// 2. Loads robots.txt for the root's host
    /// 3. Dispatches fetch-and-expand units up to the concurrency limit
    /// 4. Folds unit reports into the frontier and the result
    ///
    /// Never fails: an invalid root yields a result holding one error keyed
    /// by `root_url` exactly as given.
    pub async fn run(&self, root_url: &str) -> CrawlResult {
        let mut result = CrawlResult::start();

        let root = match normalize_url(root_url) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Invalid root URL {}: {}", root_url, e);
                result.record_error(
                    root_url,
                    format!("Invalid root_url: Must be absolute. ({})", e),
                );
                self.reporter
                    .error(
                        root_url,
                        None,
                        &format!("Invalid root_url: {}. Must be absolute.", root_url),
                    )
                    .await;
                return result.finish();
            }
        };

        tracing::info!(
            "Starting crawl of {} (max depth {}, concurrency {})",
            root,
            self.options.max_depth,
            self.options.concurrency_limit
        );

        let robots = if self.options.respect_robots_txt {
            let lookup = load_policy(&self.fetcher, &root, &self.options.user_agent).await;
            let description = lookup.describe();
            tracing::info!("{}", description);
            self.reporter.info(Some(root.as_str()), &description).await;
            lookup.into_policy()
        } else {
            tracing::debug!("robots.txt disabled for this crawl");
            None
        };

        let context = Arc::new(UnitContext {
            fetcher: self.fetcher.clone(),
            user_agent: self.options.user_agent.clone(),
            retry: RetryPolicy::new(self.options.retry_limit, self.options.backoff_base_ms),
            max_depth: self.options.max_depth,
            root: root.clone(),
            reporter: self.reporter.clone(),
        });

        let mut frontier = Frontier::new(self.options.max_depth);
        if frontier.push(root, 0).is_err() {
            tracing::error!("Could not seed the frontier");
        }

        let limit = self.options.concurrency_limit.max(1);
        let permits = Arc::new(Semaphore::new(limit));
        let mut in_flight: JoinSet<UnitReport> = JoinSet::new();
        // URLs dispatched whose report has not arrived yet
        let mut unreported: HashSet<String> = HashSet::new();
        let mut join_failure: Option<String> = None;
        let mut phase = CrawlPhase::Running;

        loop {
            while in_flight.len() < limit {
                let Some(task) = frontier.pop() else {
                    break;
                };

                if let Some(message) = self.dispatch_rejection(&task, robots.as_ref()) {
                    tracing::debug!("{}: {}", task.url, message);
                    self.reporter.info(Some(task.url.as_str()), &message).await;
                    result.record_error(task.url.as_str(), message);
                    continue;
                }

                let permit = match permits.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        tracing::error!("Concurrency limiter closed: {}", e);
                        result.record_error(
                            task.url.as_str(),
                            format!("Processing Error: {}", e),
                        );
                        continue;
                    }
                };

                unreported.insert(task.url.to_string());
                let context = Arc::clone(&context);
                in_flight.spawn(async move {
                    let _permit = permit;
                    let outcome = AssertUnwindSafe(fetch_and_expand(&context, &task))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| UnitOutcome::Failed {
                            status: None,
                            message: format!("Processing Error: {}", panic_message(&*payload)),
                        });
                    UnitReport { task, outcome }
                });
            }

            let next_phase = CrawlPhase::of(frontier.len(), in_flight.len());
            if next_phase != phase {
                tracing::trace!("Coordinator {:?} -> {:?}", phase, next_phase);
                phase = next_phase;
            }
            if phase == CrawlPhase::Done {
                break;
            }

            match in_flight.join_next().await {
                Some(Ok(report)) => {
                    unreported.remove(report.task.url.as_str());
                    self.absorb(report, &mut frontier, &mut result, robots.as_ref())
                        .await
                }
                Some(Err(e)) => {
                    tracing::warn!("Crawl unit did not complete: {}", e);
                    join_failure = Some(e.to_string());
                }
                None => {}
            }
        }

        let reason = join_failure.unwrap_or_else(|| "unit did not complete".to_string());
        for url in record_lost_units(unreported, &reason, &mut result) {
            self.reporter
                .error(&url, None, &format!("Processing Error: {}", reason))
                .await;
        }

        let result = result.finish();
        tracing::info!(
            "Crawl completed: {} pages, {} errors, {} URLs seen, {} bytes in {}ms",
            result.pages_fetched(),
            result.errors().len(),
            frontier.visited_count(),
            result.total_bytes(),
            result.elapsed_ms()
        );
        result
    }

    /// Re-checks a dequeued task before it is dispatched
    fn dispatch_rejection(
        &self,
        task: &CrawlTask,
        robots: Option<&RobotsPolicy>,
    ) -> Option<String> {
        if denied_extension(&task.url).is_some() {
            return Some(format!("Skipped due to file extension: {}", task.url.path()));
        }

        match robots {
            Some(policy) if !policy.can_fetch(&self.options.user_agent, task.url.as_str()) => {
                Some("Skipped by robots.txt".to_string())
            }
            _ => None,
        }
    }

    /// Folds one unit report into the crawl state
    async fn absorb(
        &self,
        report: UnitReport,
        frontier: &mut Frontier,
        result: &mut CrawlResult,
        robots: Option<&RobotsPolicy>,
    ) {
        let UnitReport { task, outcome } = report;
        let url = task.url.as_str();

        match outcome {
            UnitOutcome::Page {
                status,
                body,
                links,
            } => {
                let bytes = result.record_page(url, body);
                self.enqueue_links(links, task.depth + 1, frontier, result, robots)
                    .await;

                self.reporter
                    .progress(FetchProgress {
                        url: url.to_string(),
                        bytes,
                        status,
                        fetched_count: result.pages_fetched(),
                        queue_size: frontier.len(),
                    })
                    .await;
            }
            UnitOutcome::Skipped { message } => {
                tracing::debug!("{}: {}", url, message);
                self.reporter.info(Some(url), &message).await;
                result.record_error(url, message);
            }
            UnitOutcome::Failed { status, message } => {
                tracing::debug!("{}: {}", url, message);
                self.reporter.error(url, status, &message).await;
                result.record_error(url, message);
            }
        }
    }

    /// Records skipped links and enqueues the rest at `depth`
    async fn enqueue_links(
        &self,
        links: ExtractedLinks,
        depth: u32,
        frontier: &mut Frontier,
        result: &mut CrawlResult,
        robots: Option<&RobotsPolicy>,
    ) {
        for skipped in links.skipped {
            if frontier.mark_visited(&skipped.url) {
                self.reporter
                    .info(Some(skipped.url.as_str()), &skipped.reason)
                    .await;
                result.record_error(skipped.url.as_str(), skipped.reason);
            }
        }

        for link in links.follow {
            if frontier.is_visited(&link) {
                continue;
            }

            if let Some(policy) = robots {
                if !policy.can_fetch(&self.options.user_agent, link.as_str()) {
                    frontier.mark_visited(&link);
                    let message = "Skipped by robots.txt (discovered link)";
                    self.reporter.info(Some(link.as_str()), message).await;
                    result.record_error(link.as_str(), message);
                    continue;
                }
            }

            if let Err(Rejection::TooDeep) = frontier.push(link, depth) {
                tracing::trace!("Not enqueueing link beyond depth {}", frontier.max_depth());
            }
        }
    }
}

/// Fetches one page and extracts its links
async fn fetch_and_expand(context: &UnitContext, task: &CrawlTask) -> UnitOutcome {
    let url = task.url.as_str();
    context
        .reporter
        .info(Some(url), &format!("Fetching at depth {}", task.depth))
        .await;

    let fetched = context
        .fetcher
        .fetch(url, &context.user_agent, context.retry)
        .await;

    if !fetched.is_success() {
        return UnitOutcome::Failed {
            status: Some(fetched.status),
            message: format!("HTTP Error: {} - {}", fetched.status, fetched.error_message()),
        };
    }

    if !fetched.is_html() {
        return UnitOutcome::Skipped {
            message: format!("Skipped: Not HTML (Content-Type: {})", fetched.content_type()),
        };
    }

    let links = if task.depth < context.max_depth {
        extract_links(&fetched.body, &task.url, &context.root)
    } else {
        ExtractedLinks::default()
    };

    UnitOutcome::Page {
        status: fetched.status,
        body: fetched.body,
        links,
    }
}

/// Records dispatched URLs that never reported back
///
/// Returns the URLs recorded, in sorted order.
fn record_lost_units(
    unreported: HashSet<String>,
    reason: &str,
    result: &mut CrawlResult,
) -> Vec<String> {
    let mut lost: Vec<String> = unreported.into_iter().collect();
    lost.sort();
    for url in &lost {
        result.record_error(url, format!("Processing Error: {}", reason));
    }
    lost
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unit panicked".to_string()
    }
}
