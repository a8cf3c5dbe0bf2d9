//! Paginator implementation
//!
//! Drives a [`PageFetcher`] from the initial token to the terminal token.

use super::accumulator::{collect_all, CollectedListing, PartialListing};
use super::token::ContinuationToken;
use super::types::{Page, PageFetcher};
use crate::error::{Error, Result, ServiceError};
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Counters for one enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingStats {
    /// Successful fetch calls
    pub pages_fetched: u64,
    /// Items received across all fetched pages
    pub items_fetched: u64,
}

/// One enumeration of a paginated listing
///
/// Pulls are sequential and take `&mut self`: each fetch needs the token
/// returned by the previous one. Items of a fetched page are buffered and
/// handed out one at a time by [`next_item`](Self::next_item), or as the
/// whole batch by [`next_page`](Self::next_page).
///
/// The sequence ends with `None` once the service returns the terminal
/// token, or with exactly one error ([`Error::Fetch`] or
/// [`Error::Cancelled`]). Nothing is fetched after either.
pub struct Paginator<F: PageFetcher> {
    fetcher: F,
    token: ContinuationToken,
    buffer: VecDeque<F::Item>,
    cancel: CancellationToken,
    stats: ListingStats,
    finished: bool,
}

impl<F: PageFetcher> Paginator<F> {
    /// Start a new enumeration at the initial token
    pub fn start(fetcher: F) -> Self {
        Self::resume(fetcher, ContinuationToken::Initial)
    }

    /// Start an enumeration at a previously observed token
    ///
    /// Use the token from [`Error::resume_token`] to retry the page that
    /// failed. Resuming at [`ContinuationToken::Terminal`] yields nothing.
    pub fn resume(fetcher: F, token: ContinuationToken) -> Self {
        Self {
            fetcher,
            token,
            buffer: VecDeque::new(),
            cancel: CancellationToken::new(),
            stats: ListingStats::default(),
            finished: false,
        }
    }

    /// Attach a cancellation signal
    ///
    /// Cancelling aborts an in-flight fetch. Items of an already fetched
    /// page are still delivered; the next fetch boundary yields
    /// [`Error::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token the next fetch will use
    pub fn token(&self) -> &ContinuationToken {
        &self.token
    }

    /// Fetch counters so far
    pub fn stats(&self) -> ListingStats {
        self.stats
    }

    /// Get the fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Check if the sequence has ended, successfully or not
    pub fn is_finished(&self) -> bool {
        self.buffer.is_empty() && (self.finished || self.token.is_terminal())
    }

    /// Next item of the listing
    ///
    /// Fetches as many pages as needed, including past empty pages whose
    /// token is not terminal.
    pub async fn next_item(&mut self) -> Option<Result<F::Item>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            match self.fetch_next().await? {
                Ok(()) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Next batch of the listing
    ///
    /// Returns the unconsumed rest of the current page if there is one,
    /// otherwise performs exactly one fetch and returns its items, which
    /// may be empty.
    pub async fn next_page(&mut self) -> Option<Result<Vec<F::Item>>> {
        if self.buffer.is_empty() {
            if let Err(e) = self.fetch_next().await? {
                return Some(Err(e));
            }
        }
        Some(Ok(self.buffer.drain(..).collect()))
    }

    /// Drain the listing into page groups
    ///
    /// Holds the whole listing in memory; prefer the lazy methods for large
    /// containers.
    pub async fn collect_pages(
        self,
    ) -> std::result::Result<CollectedListing<F::Item>, PartialListing<F::Item>> {
        collect_all(self).await
    }

    /// Lazy stream of items
    pub fn into_stream(self) -> impl Stream<Item = Result<F::Item>> {
        stream::unfold(self, |mut paginator| async move {
            let item = paginator.next_item().await?;
            Some((item, paginator))
        })
    }

    /// Lazy stream of per-fetch batches
    pub fn into_pages(self) -> impl Stream<Item = Result<Vec<F::Item>>> {
        stream::unfold(self, |mut paginator| async move {
            let page = paginator.next_page().await?;
            Some((page, paginator))
        })
    }

    /// Perform one fetch into the buffer
    ///
    /// Returns `None` when the listing is complete or already failed.
    async fn fetch_next(&mut self) -> Option<Result<()>> {
        if self.finished || self.token.is_terminal() {
            return None;
        }

        if self.cancel.is_cancelled() {
            return Some(Err(self.fail_cancelled()));
        }

        trace!(token = %self.token, "Fetching page");

        let outcome = tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            result = self.fetcher.fetch_page(&self.token) => Some(result),
        };

        let page = match outcome {
            None => return Some(Err(self.fail_cancelled())),
            Some(Err(source)) => return Some(Err(self.fail(source))),
            Some(Ok(page)) => page,
        };

        if page.next.is_initial() {
            return Some(Err(self.fail(ServiceError::protocol(
                "service returned the initial token as continuation",
            ))));
        }

        self.accept(page);
        Some(Ok(()))
    }

    fn accept(&mut self, page: Page<F::Item>) {
        let (items, next) = page.into_parts();

        self.stats.pages_fetched += 1;
        self.stats.items_fetched += items.len() as u64;

        debug!(
            page = self.stats.pages_fetched,
            items = items.len(),
            more = next.not_done(),
            "Fetched page"
        );

        self.buffer.extend(items);
        self.token = next;
    }

    fn fail(&mut self, source: ServiceError) -> Error {
        self.finished = true;
        debug!(token = %self.token, error = %source, "Page fetch failed");
        Error::fetch(self.token.clone(), source)
    }

    fn fail_cancelled(&mut self) -> Error {
        self.finished = true;
        debug!(token = %self.token, "Listing cancelled");
        Error::Cancelled {
            token: self.token.clone(),
        }
    }
}

impl<F: PageFetcher> std::fmt::Debug for Paginator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("token", &self.token)
            .field("buffered", &self.buffer.len())
            .field("stats", &self.stats)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
