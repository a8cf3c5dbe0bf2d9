//! Object store listings (S3, R2, GCS, Azure, local, memory)
//!
//! Any [`ObjectStore`] can be listed in marker style: the marker is the
//! last key of the previous page and the next page starts after it. Cloud
//! backends and the in-memory store list keys in lexicographic order, so the
//! next page is requested with `list_with_offset`. The local filesystem lists
//! in directory-walk order; its pages are cut from a sorted full listing.

use super::types::{ObjectItem, ObjectProperties};
use crate::error::{Error, Result, ServiceResult};
use crate::pagination::{ContinuationToken, Page, PageFetcher, Paginator};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;

/// Default number of keys per object store page
pub const DEFAULT_STORE_PAGE_SIZE: usize = 1000;

/// An object store plus a key prefix, parsed from a URL
#[derive(Debug, Clone)]
pub struct StoreLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Key prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
    /// Whether the store lists keys in lexicographic order
    ordered: bool,
}

impl StoreLocation {
    /// Parse a location URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `memory://path/` - In-process store
    /// - `/local/path/` or `file:///path/` - Local filesystem
    ///
    /// Cloud credentials are read from the environment by each builder.
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else if let Some(prefix) = url.strip_prefix("memory://") {
            Ok(Self::new(Arc::new(InMemory::new()), prefix, "memory"))
        } else {
            Self::parse_local(url)
        }
    }

    /// Wrap an existing store
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str, scheme: &str) -> Self {
        Self {
            store,
            prefix: prefix.trim_matches('/').to_string(),
            scheme: scheme.to_string(),
            ordered: scheme != "file",
        }
    }

    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = split_bucket(url, scheme)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 needs its account endpoint: https://<account_id>.r2.cloudflarestorage.com
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, scheme))
    }

    fn parse_gcs(url: &str) -> Result<Self> {
        let (bucket, prefix) = split_bucket(url, "gs")?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, "gs"))
    }

    fn parse_azure(url: &str) -> Result<Self> {
        let (container, prefix) = split_bucket(url, "az")?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self::new(Arc::new(store), prefix, "az"))
    }

    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::new(Arc::new(store), "", "file"))
    }

    /// Get the scheme (s3, r2, gs, az, memory, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Key prefix, without surrounding slashes
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Check if this is a cloud location
    pub fn is_cloud(&self) -> bool {
        !matches!(self.scheme.as_str(), "file" | "memory")
    }

    /// Check if the store lists keys in lexicographic order
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    fn path(&self, name: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(name)
        } else {
            ObjectPath::from(format!("{}/{name}", self.prefix))
        }
    }

    /// Write an object
    pub async fn put(&self, name: &str, data: Bytes) -> ServiceResult<()> {
        self.store.put(&self.path(name), data.into()).await?;
        Ok(())
    }

    /// Read a whole object
    pub async fn get(&self, name: &str) -> ServiceResult<Bytes> {
        let result = self.store.get(&self.path(name)).await?;
        Ok(result.bytes().await?)
    }

    /// Delete an object
    pub async fn delete(&self, name: &str) -> ServiceResult<()> {
        self.store.delete(&self.path(name)).await?;
        Ok(())
    }

    /// Fetcher over this location's keys
    pub fn fetcher(&self, page_size: usize) -> StoreListFetcher {
        let prefix = (!self.prefix.is_empty()).then(|| ObjectPath::from(self.prefix.as_str()));
        let fetcher = StoreListFetcher::new(self.store.clone(), prefix, page_size);
        if self.ordered {
            fetcher
        } else {
            fetcher.unordered()
        }
    }

    /// Enumerate every key under the prefix
    pub fn list(&self, page_size: usize) -> Paginator<StoreListFetcher> {
        Paginator::start(self.fetcher(page_size))
    }
}

fn split_bucket<'a>(url: &'a str, scheme: &str) -> Result<(&'a str, &'a str)> {
    let without_scheme = url
        .strip_prefix(&format!("{scheme}://"))
        .ok_or_else(|| Error::config(format!("Invalid {scheme} URL: {url}")))?;

    let (bucket, prefix) = match without_scheme.find('/') {
        Some(idx) => (&without_scheme[..idx], &without_scheme[idx + 1..]),
        None => (without_scheme, ""),
    };

    if bucket.is_empty() {
        return Err(Error::config(format!("Missing bucket in {scheme} URL: {url}")));
    }
    Ok((bucket, prefix))
}

/// Fetches bounded pages of keys from an object store
#[derive(Debug, Clone)]
pub struct StoreListFetcher {
    store: Arc<dyn ObjectStore>,
    prefix: Option<ObjectPath>,
    page_size: usize,
    ordered: bool,
}

impl StoreListFetcher {
    /// Create a fetcher for a store that lists keys in lexicographic order
    ///
    /// A zero page size is raised to one.
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<ObjectPath>, page_size: usize) -> Self {
        Self {
            store,
            prefix,
            page_size: page_size.max(1),
            ordered: true,
        }
    }

    /// Treat the store's listing order as arbitrary
    ///
    /// Every page then lists the whole prefix and sorts it before cutting
    /// the page after the marker.
    #[must_use]
    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    async fn ordered_page(&self, marker: Option<&str>) -> ServiceResult<Vec<ObjectMeta>> {
        let listing = match marker {
            Some(marker) => self
                .store
                .list_with_offset(self.prefix.as_ref(), &ObjectPath::from(marker)),
            None => self.store.list(self.prefix.as_ref()),
        };
        Ok(listing.take(self.page_size).try_collect().await?)
    }

    async fn sorted_page(&self, marker: Option<&str>) -> ServiceResult<Vec<ObjectMeta>> {
        let mut metas: Vec<ObjectMeta> =
            self.store.list(self.prefix.as_ref()).try_collect().await?;
        metas.sort_by(|a, b| a.location.as_ref().cmp(b.location.as_ref()));

        let start = marker.map_or(0, |marker| {
            metas.partition_point(|meta| meta.location.as_ref() <= marker)
        });
        Ok(metas.into_iter().skip(start).take(self.page_size).collect())
    }
}

#[async_trait]
impl PageFetcher for StoreListFetcher {
    type Item = ObjectItem;

    async fn fetch_page(&self, token: &ContinuationToken) -> ServiceResult<Page<ObjectItem>> {
        let metas = if self.ordered {
            self.ordered_page(token.as_marker()).await?
        } else {
            self.sorted_page(token.as_marker()).await?
        };

        // A short page is the last one; a full page may or may not be
        let next = match metas.last() {
            Some(last) if metas.len() == self.page_size => {
                ContinuationToken::marker(last.location.as_ref())
            }
            _ => ContinuationToken::Terminal,
        };

        let items = metas.into_iter().map(object_item).collect();
        Ok(Page::new(items, next))
    }
}

fn object_item(meta: ObjectMeta) -> ObjectItem {
    ObjectItem {
        name: meta.location.to_string(),
        properties: ObjectProperties {
            content_length: Some(meta.size as u64),
            content_type: None,
            last_modified: Some(meta.last_modified),
            etag: meta.e_tag,
            blob_type: None,
        },
        metadata: Default::default(),
    }
}
