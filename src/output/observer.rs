//! Progress observer interface
//!
//! The crawler never prints or logs on behalf of a caller's UI. Instead it
//! reports through an injected [`ProgressObserver`], which may be slow or
//! suspend (e.g. to redraw a terminal status line) without affecting crawl
//! correctness.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Snapshot emitted after each successfully stored page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProgress {
    /// The page that was stored
    pub url: String,

    /// UTF-8 byte length of the stored body
    pub bytes: usize,

    /// HTTP status of the final response
    pub status: u16,

    /// Pages stored so far, this one included
    pub fetched_count: usize,

    /// Tasks still waiting in the frontier
    pub queue_size: usize,
}

/// Owned form of a single observer callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Info {
        url: Option<String>,
        message: String,
    },
    Progress(FetchProgress),
    Error {
        url: String,
        status: Option<u16>,
        message: String,
    },
}

impl ProgressEvent {
    /// The URL the event refers to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Info { url, .. } => url.as_deref(),
            Self::Progress(progress) => Some(&progress.url),
            Self::Error { url, .. } => Some(url),
        }
    }
}

/// Receives crawl progress
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use sumi_harvest::output::{FetchProgress, ProgressObserver};
///
/// struct Counter;
///
/// #[async_trait]
/// impl ProgressObserver for Counter {
///     async fn on_info(&self, _url: Option<&str>, _message: &str) {}
///     async fn on_progress(&self, progress: &FetchProgress) {
///         println!("{} pages so far", progress.fetched_count);
///     }
///     async fn on_error(&self, _url: &str, _status: Option<u16>, _message: &str) {}
/// }
/// ```
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// Informational notice (skips, robots.txt status, dispatches)
    async fn on_info(&self, url: Option<&str>, message: &str);

    /// A page was stored
    async fn on_progress(&self, progress: &FetchProgress);

    /// A URL failed or the crawl could not start
    async fn on_error(&self, url: &str, status: Option<u16>, message: &str);
}

/// Observer that turns events into `tracing` records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

#[async_trait]
impl ProgressObserver for TracingObserver {
    async fn on_info(&self, url: Option<&str>, message: &str) {
        match url {
            Some(url) => tracing::debug!("{} {}", message, url),
            None => tracing::info!("{}", message),
        }
    }

    async fn on_progress(&self, progress: &FetchProgress) {
        tracing::info!(
            "Fetched {} ({}B) - Status {}. Total: {}. Queue: {}",
            progress.url,
            progress.bytes,
            progress.status,
            progress.fetched_count,
            progress.queue_size
        );
    }

    async fn on_error(&self, url: &str, status: Option<u16>, message: &str) {
        match status {
            Some(status) => tracing::warn!("{} - Status {} {}", url, status, message),
            None => tracing::warn!("{} - {}", url, message),
        }
    }
}

/// Observer that forwards every event into an unbounded channel
///
/// Sending never blocks; events sent after the receiver is dropped are
/// discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ProgressObserver for ChannelObserver {
    async fn on_info(&self, url: Option<&str>, message: &str) {
        let _ = self.sender.send(ProgressEvent::Info {
            url: url.map(str::to_string),
            message: message.to_string(),
        });
    }

    async fn on_progress(&self, progress: &FetchProgress) {
        let _ = self.sender.send(ProgressEvent::Progress(progress.clone()));
    }

    async fn on_error(&self, url: &str, status: Option<u16>, message: &str) {
        let _ = self.sender.send(ProgressEvent::Error {
            url: url.to_string(),
            status,
            message: message.to_string(),
        });
    }
}

/// Optional observer handle used inside the crawler
#[derive(Clone, Default)]
pub(crate) struct Reporter {
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl Reporter {
    pub(crate) fn new(observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        Self { observer }
    }

    pub(crate) async fn info(&self, url: Option<&str>, message: &str) {
        if let Some(observer) = &self.observer {
            observer.on_info(url, message).await;
        }
    }

    pub(crate) async fn progress(&self, progress: FetchProgress) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&progress).await;
        }
    }

    pub(crate) async fn error(&self, url: &str, status: Option<u16>, message: &str) {
        if let Some(observer) = &self.observer {
            observer.on_error(url, status, message).await;
        }
    }
}
