//! Output module for crawl progress and summaries
//!
//! This module handles:
//! - Delivering progress events to an injected observer
//! - Summarizing a finished crawl

mod observer;
mod summary;

pub use observer::{ChannelObserver, FetchProgress, ProgressEvent, ProgressObserver, TracingObserver};
pub use summary::{print_summary, CrawlStatistics, ErrorKind};

pub(crate) use observer::Reporter;
