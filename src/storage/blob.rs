//! Blob service client
//!
//! Handles for the service, a container and a single blob. Container
//! listings go through [`BlobListFetcher`] and the shared [`Paginator`].

use super::endpoint::{child_url, ServiceEndpoint};
use super::types::{ListOptions, ObjectItem};
use super::xml::parse_blob_page;
use crate::config::StorageConfig;
use crate::error::{Result, ServiceError, ServiceResult};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{ContinuationToken, Page, PageFetcher, Paginator};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::Method;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Blob service of one account
#[derive(Debug, Clone)]
pub struct BlobServiceClient {
    http: Arc<HttpClient>,
    endpoint: ServiceEndpoint,
}

impl BlobServiceClient {
    /// Create a client for an endpoint
    pub fn new(http: Arc<HttpClient>, endpoint: ServiceEndpoint) -> Self {
        Self { http, endpoint }
    }

    /// Create a client from configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let http = HttpClient::with_config(config.http_client_config())?;
        Ok(Self::new(Arc::new(http), config.blob_endpoint()?))
    }

    /// Service endpoint
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Handle for a container
    pub fn container(&self, name: &str) -> ContainerClient {
        ContainerClient {
            http: self.http.clone(),
            url: child_url(self.endpoint.url(), name),
            name: name.to_string(),
        }
    }
}

/// A blob container
#[derive(Debug, Clone)]
pub struct ContainerClient {
    http: Arc<HttpClient>,
    url: Url,
    name: String,
}

impl ContainerClient {
    /// Container name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Handle for a blob in this container
    pub fn blob(&self, name: &str) -> BlobClient {
        BlobClient {
            http: self.http.clone(),
            url: child_url(&self.url, name),
            name: name.to_string(),
        }
    }

    /// Create the container, with no metadata and no public access
    pub async fn create(&self) -> ServiceResult<()> {
        self.http
            .put(&self.url, RequestConfig::new().query("restype", "container"))
            .await?;
        info!(container = %self.name, "Created container");
        Ok(())
    }

    /// Delete the container
    pub async fn delete(&self) -> ServiceResult<()> {
        self.http
            .delete(&self.url, RequestConfig::new().query("restype", "container"))
            .await?;
        info!(container = %self.name, "Deleted container");
        Ok(())
    }

    /// Upload a block blob and return a handle to it
    pub async fn upload_blob(
        &self,
        name: &str,
        content_type: &str,
        data: impl Into<Bytes>,
    ) -> ServiceResult<BlobClient> {
        let blob = self.blob(name);
        blob.upload(content_type, data).await?;
        Ok(blob)
    }

    /// Download a blob's contents
    pub async fn download_blob(&self, name: &str) -> ServiceResult<Bytes> {
        self.blob(name).download().await
    }

    /// Delete a blob
    pub async fn delete_blob(&self, name: &str) -> ServiceResult<()> {
        self.blob(name).delete().await
    }

    /// Fetcher for this container's blob listing
    pub fn fetcher(&self, options: ListOptions) -> BlobListFetcher {
        BlobListFetcher {
            http: self.http.clone(),
            url: self.url.clone(),
            options,
        }
    }

    /// Enumerate all blobs, one segment at a time
    pub fn list_blobs(&self) -> Paginator<BlobListFetcher> {
        self.list_blobs_with(ListOptions::default())
    }

    /// Enumerate blobs with a prefix or page size
    pub fn list_blobs_with(&self, options: ListOptions) -> Paginator<BlobListFetcher> {
        Paginator::start(self.fetcher(options))
    }
}

/// A single blob
#[derive(Debug, Clone)]
pub struct BlobClient {
    http: Arc<HttpClient>,
    url: Url,
    name: String,
}

impl BlobClient {
    /// Blob name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blob URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Upload the blob's contents as a block blob
    pub async fn upload(&self, content_type: &str, data: impl Into<Bytes>) -> ServiceResult<()> {
        let data = data.into();
        let size = data.len();
        self.http
            .put(
                &self.url,
                RequestConfig::new()
                    .header("x-ms-blob-type", "BlockBlob")
                    .header("Content-Type", content_type)
                    .body(data),
            )
            .await?;
        info!(blob = %self.name, size, "Uploaded blob");
        Ok(())
    }

    /// Download the whole blob
    pub async fn download(&self) -> ServiceResult<Bytes> {
        let response = self.http.get(&self.url, RequestConfig::new()).await?;
        Ok(response.bytes().await?)
    }

    /// Download the blob as a byte stream
    pub async fn download_stream(
        &self,
    ) -> ServiceResult<impl Stream<Item = ServiceResult<Bytes>>> {
        let response = self.http.get(&self.url, RequestConfig::new()).await?;
        Ok(response.bytes_stream().map_err(ServiceError::from))
    }

    /// Delete the blob
    pub async fn delete(&self) -> ServiceResult<()> {
        self.http.delete(&self.url, RequestConfig::new()).await?;
        info!(blob = %self.name, "Deleted blob");
        Ok(())
    }
}

/// Fetches flat blob listing segments of one container
#[derive(Debug, Clone)]
pub struct BlobListFetcher {
    http: Arc<HttpClient>,
    url: Url,
    options: ListOptions,
}

#[async_trait]
impl PageFetcher for BlobListFetcher {
    type Item = ObjectItem;

    async fn fetch_page(&self, token: &ContinuationToken) -> ServiceResult<Page<ObjectItem>> {
        let request = RequestConfig::new()
            .query("restype", "container")
            .query("comp", "list")
            .query_opt("marker", token.as_marker())
            .query_opt("prefix", self.options.prefix.as_deref())
            .query_opt("maxresults", self.options.page_size.map(|n| n.to_string()));

        let body = self.http.request_text(Method::GET, &self.url, request).await?;
        parse_blob_page(&body)
    }
}
