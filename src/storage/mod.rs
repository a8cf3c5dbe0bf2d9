//! Storage service clients
//!
//! Entity handles for the blob and file services, single-object operations,
//! and the page fetchers that plug each listing into the shared
//! [`Paginator`](crate::pagination::Paginator).
//!
//! # Overview
//!
//! | Handle | Listing | Fetcher |
//! |--------|---------|---------|
//! | [`ContainerClient`] | blobs, flat | [`BlobListFetcher`] |
//! | [`DirectoryClient`] | files and directories | [`DirectoryListFetcher`] |
//! | [`StoreLocation`] | object store keys | [`StoreListFetcher`] |

mod blob;
mod endpoint;
mod file;
mod store;
mod types;
mod xml;

pub use blob::{BlobClient, BlobListFetcher, BlobServiceClient, ContainerClient};
pub use endpoint::{ServiceEndpoint, ACCOUNT_PLACEHOLDER, DEFAULT_BLOB_ENDPOINT, DEFAULT_FILE_ENDPOINT};
pub use file::{
    DirectoryClient, DirectoryListFetcher, FileClient, FileServiceClient, ShareClient,
    SHARE_ALREADY_EXISTS,
};
pub use store::{StoreListFetcher, StoreLocation, DEFAULT_STORE_PAGE_SIZE};
pub use types::{DirectoryEntryItem, EntryKind, ListOptions, ObjectItem, ObjectProperties};

#[cfg(test)]
mod tests;
