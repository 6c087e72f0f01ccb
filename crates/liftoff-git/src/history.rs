//! Lazy paginated history

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use liftoff_core::Result;
use tracing::debug;

use crate::hosting::Hosting;
use crate::types::{Commit, HostedRelease, PullRequest};

/// A page of results plus the cursor of the following page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Cursor of the next page, `None` on the last page
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A page with a follow-up cursor
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// The final page
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

type PageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<Page<T>>> + Send + 'a>>;
type PageFetcher<'a, T> = Box<dyn FnMut(Option<String>) -> PageFuture<'a, T> + Send + 'a>;

/// Forward-only sequence over a paginated listing.
///
/// Pages are requested only when the buffer runs dry, and never past
/// `max` items. Dropping the history stops the walk. A failed fetch leaves
/// the cursor untouched, so calling [`History::next`] again retries the
/// same page.
pub struct History<'a, T> {
    fetch: PageFetcher<'a, T>,
    cursor: Option<String>,
    buffer: VecDeque<T>,
    exhausted: bool,
    remaining: usize,
    pages_fetched: usize,
}

impl<'a, T> History<'a, T> {
    /// Build a history from a page fetcher, bounded to `max` items
    pub fn new<F>(max: usize, fetch: F) -> Self
    where
        F: FnMut(Option<String>) -> PageFuture<'a, T> + Send + 'a,
    {
        Self {
            fetch: Box::new(fetch),
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: max == 0,
            remaining: max,
            pages_fetched: 0,
        }
    }

    /// Next item, fetching another page when needed
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        while self.buffer.is_empty() {
            if self.exhausted {
                return Ok(None);
            }
            let page = (self.fetch)(self.cursor.clone()).await?;
            self.pages_fetched += 1;
            debug!(
                items = page.items.len(),
                page = self.pages_fetched,
                "fetched history page"
            );
            self.exhausted = page.next_cursor.is_none();
            self.cursor = page.next_cursor;
            self.buffer.extend(page.items);
        }

        self.remaining -= 1;
        Ok(self.buffer.pop_front())
    }

    /// Drain the remaining items
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

impl<'a> History<'a, Commit> {
    /// Commits reachable from `branch`, newest first
    pub fn merge_commits<H>(hosting: &'a H, branch: &str, max: usize) -> Self
    where
        H: Hosting + ?Sized,
    {
        let branch = branch.to_string();
        Self::new(max, move |cursor| -> PageFuture<'a, Commit> {
            let branch = branch.clone();
            Box::pin(async move { hosting.commits_page(&branch, cursor).await })
        })
    }
}

impl<'a> History<'a, HostedRelease> {
    /// Releases, newest first
    pub fn releases<H>(hosting: &'a H, max: usize) -> Self
    where
        H: Hosting + ?Sized,
    {
        Self::new(max, move |cursor| -> PageFuture<'a, HostedRelease> {
            Box::pin(async move { hosting.releases_page(cursor).await })
        })
    }
}

impl<'a> History<'a, PullRequest> {
    /// Pull requests merged into `branch`, most recent first
    pub fn merged_pull_requests<H>(hosting: &'a H, branch: &str, max: usize) -> Self
    where
        H: Hosting + ?Sized,
    {
        let branch = branch.to_string();
        Self::new(max, move |cursor| -> PageFuture<'a, PullRequest> {
            let branch = branch.clone();
            Box::pin(async move { hosting.merged_pull_requests_page(&branch, cursor).await })
        })
    }
}
