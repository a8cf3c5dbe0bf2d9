// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # segstore
//!
//! Segmented listings and object operations for remote blob and file
//! storage services.
//!
//! ## Features
//!
//! - **Marker Pagination**: One paginator drives every listing call, fetching
//!   a page at a time and following the service's continuation marker
//! - **Resumable Listings**: Every failure reports the exact token to resume from
//! - **Cancellation**: Listings stop at the next page boundary when cancelled
//! - **Blob and File Services**: Containers, blobs, shares, directories, files
//! - **Object Stores**: The same listing over S3, R2, GCS, Azure, local disk
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use segstore::{BlobServiceClient, ListOptions, StorageConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = StorageConfig::load("account.yaml")?.with_env_overrides();
//!     let container = BlobServiceClient::from_config(&config)?.container("photos");
//!
//!     // One page-sized request at a time, items in service order
//!     let mut blobs = container.list_blobs_with(ListOptions::new().page_size(500));
//!     while let Some(blob) = blobs.next_item().await {
//!         println!("{}", blob?.name);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                Paginator<F: PageFetcher>                     │
//! │  next_item() / next_page() / into_stream() / collect_pages() │
//! │  ContinuationToken: Initial → Marker(..) → Terminal          │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────────┬───────────┴────────────┬──────────────────┐
//! │ BlobListFetcher  │ DirectoryListFetcher   │ StoreListFetcher │
//! ├──────────────────┼────────────────────────┼──────────────────┤
//! │ comp=list        │ restype=directory      │ list_with_offset │
//! │ EnumerationResults XML                    │ object_store     │
//! └──────────────────┴────────────────────────┴──────────────────┘
//!                                │
//!               HttpClient (retry, backoff, credentials)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and credentials
pub mod http;

/// Continuation-token pagination
pub mod pagination;

/// Blob, file and object store clients
pub mod storage;

/// Account configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, FetchError, Result, ServiceError, ServiceResult};
pub use types::*;

// Re-export commonly used types
pub use config::StorageConfig;
pub use http::{Credential, HttpClient, HttpClientConfig};
pub use pagination::{
    collect_all, CollectedListing, ContinuationToken, Page, PageFetcher, Paginator,
    PartialListing,
};
pub use storage::{
    BlobClient, BlobServiceClient, ContainerClient, DirectoryClient, DirectoryEntryItem,
    FileClient, FileServiceClient, ListOptions, ObjectItem, ShareClient, StoreLocation,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
