//! Page and fetcher abstractions
//!
//! Defines the contract between the paginator and the services it lists.

use super::token::ContinuationToken;
use crate::error::ServiceResult;
use async_trait::async_trait;
use std::sync::Arc;

/// One bounded batch of items returned by a single fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in service order
    pub items: Vec<T>,
    /// Token for the following fetch
    pub next: ContinuationToken,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, next: ContinuationToken) -> Self {
        Self { items, next }
    }

    /// Create the final page of a listing
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, ContinuationToken::Terminal)
    }

    /// Number of items in this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page carries no items
    ///
    /// An empty page does not end a listing; only a terminal `next` does.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if this is the final page
    pub fn is_last(&self) -> bool {
        self.next.is_terminal()
    }

    /// Split into items and next token
    pub fn into_parts(self) -> (Vec<T>, ContinuationToken) {
        (self.items, self.next)
    }
}

/// Fetches one page of a listing
///
/// Implementations are bound to one entity at construction time and wrap
/// a single remote list call. They must return items in service order and
/// must not repeat items across tokens.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Item type produced by this listing
    type Item: Send;

    /// Fetch the page that starts at `token`
    ///
    /// Never called with [`ContinuationToken::Terminal`].
    async fn fetch_page(&self, token: &ContinuationToken) -> ServiceResult<Page<Self::Item>>;
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Arc<F> {
    type Item = F::Item;

    async fn fetch_page(&self, token: &ContinuationToken) -> ServiceResult<Page<Self::Item>> {
        (**self).fetch_page(token).await
    }
}

#[async_trait]
impl<'a, F: PageFetcher + ?Sized> PageFetcher for &'a F {
    type Item = F::Item;

    async fn fetch_page(&self, token: &ContinuationToken) -> ServiceResult<Page<Self::Item>> {
        (**self).fetch_page(token).await
    }
}
