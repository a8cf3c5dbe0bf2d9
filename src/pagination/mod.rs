//! Pagination module
//!
//! Segmented listing over a continuation-token ("marker") protocol.
//!
//! # Overview
//!
//! A [`PageFetcher`] knows how to fetch one page of a listing for one entity
//! (a container's blobs, a share directory's entries, an object store
//! prefix). The [`Paginator`] drives it: it owns the [`ContinuationToken`],
//! calls the fetcher strictly one page at a time, and hands out items lazily
//! until the service returns the terminal token.
//!
//! [`collect_all`] is the opt-in materializing path. It keeps page
//! boundaries, which makes it handy for diagnostics, but holds the whole
//! listing in memory.
//!
//! ```rust,ignore
//! let mut listing = container.list_blobs();
//! while let Some(blob) = listing.next_item().await {
//!     println!("{}", blob?.name);
//! }
//! ```

mod accumulator;
mod paginator;
mod token;
mod types;

pub use accumulator::{collect_all, CollectedListing, PageGroup, PartialListing};
pub use paginator::{ListingStats, Paginator};
pub use token::ContinuationToken;
pub use types::{Page, PageFetcher};

#[cfg(test)]
mod tests;
