//! Crawl frontier: FIFO work queue plus visited set
//!
//! URLs are marked visited when they are enqueued, not when they are
//! fetched, so a page linked from many places is scheduled exactly once and
//! at the smallest depth it was first discovered at.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized absolute URL
    pub url: Url,

    /// Link hops from the root (root is 0)
    pub depth: u32,
}

/// Why a candidate was not enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The URL was already enqueued at some point
    AlreadySeen,
    /// The URL would exceed the crawl's maximum depth
    TooDeep,
}

/// FIFO queue of pending tasks with dedup
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier bounded by `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            max_depth,
        }
    }

    /// Enqueues a URL at `depth`, marking it visited
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The task was enqueued
    /// * `Err(Rejection)` - The URL was seen before or is too deep
    pub fn push(&mut self, url: Url, depth: u32) -> Result<(), Rejection> {
        if depth > self.max_depth {
            return Err(Rejection::TooDeep);
        }
        if !self.mark_visited(&url) {
            return Err(Rejection::AlreadySeen);
        }
        self.queue.push_back(CrawlTask { url, depth });
        Ok(())
    }

    /// Marks a URL as visited without enqueueing it
    ///
    /// Used for links that are rejected before dispatch so they are
    /// reported once. Returns false if the URL was already visited.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    /// Returns true if the URL has been enqueued or marked
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Dequeues the oldest pending task
    pub fn pop(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs ever enqueued or marked
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
