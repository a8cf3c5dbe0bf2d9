//! Materialized listings
//!
//! Drains a paginator into memory while keeping the page boundaries the
//! service produced.

use super::paginator::Paginator;
use super::types::PageFetcher;
use crate::error::Error;
use std::fmt;

/// Items delivered by one fetch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGroup<T> {
    /// Zero-based fetch index within the enumeration
    pub index: usize,
    /// Items in service order
    pub items: Vec<T>,
}

impl<T> PageGroup<T> {
    /// Number of items in the group
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the fetch returned no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A fully drained listing, grouped by fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedListing<T> {
    pages: Vec<PageGroup<T>>,
}

impl<T> Default for CollectedListing<T> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

impl<T> CollectedListing<T> {
    fn push(&mut self, items: Vec<T>) {
        let index = self.pages.len();
        self.pages.push(PageGroup { index, items });
    }

    /// Page groups in fetch order
    pub fn pages(&self) -> &[PageGroup<T>] {
        &self.pages
    }

    /// Number of fetch calls that succeeded
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of items
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(PageGroup::len).sum()
    }

    /// Size of each page group
    pub fn page_sizes(&self) -> Vec<usize> {
        self.pages.iter().map(PageGroup::len).collect()
    }

    /// Iterate over all items in listing order
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    /// Flatten into items in listing order
    pub fn into_items(self) -> Vec<T> {
        self.pages.into_iter().flat_map(|page| page.items).collect()
    }

    /// Take the page groups
    pub fn into_pages(self) -> Vec<PageGroup<T>> {
        self.pages
    }
}

/// A listing that failed partway
///
/// `collected` holds every page fetched before `error` occurred.
pub struct PartialListing<T> {
    /// Pages that completed before the failure, in fetch order
    pub collected: CollectedListing<T>,
    /// The listing's terminal error, carrying the token to resume from
    pub error: Error,
}

impl<T> PartialListing<T> {
    /// Drop the partial results and keep the error
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl<T> fmt::Debug for PartialListing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialListing")
            .field("pages", &self.collected.page_count())
            .field("items", &self.collected.item_count())
            .field("error", &self.error)
            .finish()
    }
}

impl<T> fmt::Display for PartialListing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "listing stopped after {} page(s): {}",
            self.collected.page_count(),
            self.error
        )
    }
}

impl<T> std::error::Error for PartialListing<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<PartialListing<T>> for Error {
    fn from(partial: PartialListing<T>) -> Self {
        partial.error
    }
}

/// Drain a paginator into page groups
///
/// Every fetch call becomes one [`PageGroup`], empty pages included, in fetch
/// order. The whole listing is held in memory, so use this only when the
/// listing is known to be modest; otherwise consume the paginator lazily.
pub async fn collect_all<F: PageFetcher>(
    mut paginator: Paginator<F>,
) -> Result<CollectedListing<F::Item>, PartialListing<F::Item>> {
    let mut collected = CollectedListing::default();

    while let Some(page) = paginator.next_page().await {
        match page {
            Ok(items) => collected.push(items),
            Err(error) => return Err(PartialListing { collected, error }),
        }
    }

    Ok(collected)
}
