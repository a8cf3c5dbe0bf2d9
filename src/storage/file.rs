//! File service client
//!
//! Handles for the service, a share, a directory and a file. Directory
//! listings go through [`DirectoryListFetcher`] and the shared
//! [`Paginator`].

use super::endpoint::{child_url, ServiceEndpoint};
use super::types::{DirectoryEntryItem, ListOptions};
use super::xml::parse_directory_page;
use crate::config::StorageConfig;
use crate::error::{Result, ServiceError, ServiceResult};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{ContinuationToken, Page, PageFetcher, Paginator};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Service error code for creating a share that exists
pub const SHARE_ALREADY_EXISTS: &str = "ShareAlreadyExists";

/// File service of one account
#[derive(Debug, Clone)]
pub struct FileServiceClient {
    http: Arc<HttpClient>,
    endpoint: ServiceEndpoint,
}

impl FileServiceClient {
    /// Create a client for an endpoint
    pub fn new(http: Arc<HttpClient>, endpoint: ServiceEndpoint) -> Self {
        Self { http, endpoint }
    }

    /// Create a client from configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let http = HttpClient::with_config(config.http_client_config())?;
        Ok(Self::new(Arc::new(http), config.file_endpoint()?))
    }

    /// Service endpoint
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Handle for a share
    pub fn share(&self, name: &str) -> ShareClient {
        ShareClient {
            http: self.http.clone(),
            url: child_url(self.endpoint.url(), name),
            name: name.to_string(),
        }
    }
}

/// A file share
#[derive(Debug, Clone)]
pub struct ShareClient {
    http: Arc<HttpClient>,
    url: Url,
    name: String,
}

impl ShareClient {
    /// Share name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Share URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Create the share with default quota
    ///
    /// A share that already exists counts as created.
    pub async fn create(&self) -> ServiceResult<()> {
        match self
            .http
            .put(&self.url, RequestConfig::new().query("restype", "share"))
            .await
        {
            Ok(_) => {
                info!(share = %self.name, "Created share");
                Ok(())
            }
            Err(e) if e.error_code() == Some(SHARE_ALREADY_EXISTS) => {
                debug!(share = %self.name, "Share already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the share
    pub async fn delete(&self) -> ServiceResult<()> {
        self.http
            .delete(&self.url, RequestConfig::new().query("restype", "share"))
            .await?;
        info!(share = %self.name, "Deleted share");
        Ok(())
    }

    /// Handle for the share's root directory
    pub fn root_directory(&self) -> DirectoryClient {
        DirectoryClient {
            http: self.http.clone(),
            url: self.url.clone(),
            path: String::new(),
        }
    }

    /// Handle for a file in the root directory
    pub fn file(&self, name: &str) -> FileClient {
        self.root_directory().file(name)
    }

    /// Upload a file into the root directory and return a handle to it
    pub async fn upload_file(
        &self,
        name: &str,
        content_type: &str,
        data: impl Into<Bytes>,
    ) -> ServiceResult<FileClient> {
        let file = self.file(name);
        file.upload(content_type, data).await?;
        Ok(file)
    }

    /// Download a file from the root directory
    pub async fn download_file(&self, name: &str) -> ServiceResult<Bytes> {
        self.file(name).download().await
    }

    /// Enumerate the root directory
    pub fn list_files_and_directories(&self) -> Paginator<DirectoryListFetcher> {
        self.root_directory().list_files_and_directories()
    }
}

/// A directory inside a share
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: Arc<HttpClient>,
    url: Url,
    path: String,
}

impl DirectoryClient {
    /// Path relative to the share root; empty for the root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Handle for a child directory
    pub fn subdirectory(&self, name: &str) -> DirectoryClient {
        let path = if self.path.is_empty() {
            name.trim_matches('/').to_string()
        } else {
            format!("{}/{}", self.path, name.trim_matches('/'))
        };
        DirectoryClient {
            http: self.http.clone(),
            url: child_url(&self.url, name),
            path,
        }
    }

    /// Handle for a file in this directory
    pub fn file(&self, name: &str) -> FileClient {
        FileClient {
            http: self.http.clone(),
            url: child_url(&self.url, name),
            name: name.to_string(),
        }
    }

    /// Create this directory
    pub async fn create(&self) -> ServiceResult<()> {
        self.http
            .put(&self.url, RequestConfig::new().query("restype", "directory"))
            .await?;
        info!(directory = %self.path, "Created directory");
        Ok(())
    }

    /// Fetcher for this directory's listing
    pub fn fetcher(&self, options: ListOptions) -> DirectoryListFetcher {
        DirectoryListFetcher {
            http: self.http.clone(),
            url: self.url.clone(),
            options,
        }
    }

    /// Enumerate files and directories, one segment at a time
    pub fn list_files_and_directories(&self) -> Paginator<DirectoryListFetcher> {
        self.list_files_and_directories_with(ListOptions::default())
    }

    /// Enumerate with a prefix or page size
    pub fn list_files_and_directories_with(
        &self,
        options: ListOptions,
    ) -> Paginator<DirectoryListFetcher> {
        Paginator::start(self.fetcher(options))
    }
}

/// A single file
#[derive(Debug, Clone)]
pub struct FileClient {
    http: Arc<HttpClient>,
    url: Url,
    name: String,
}

impl FileClient {
    /// File name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Create the file and write its contents
    ///
    /// Files are created at their final size and then filled with a single
    /// range write. An empty file needs no range write.
    pub async fn upload(&self, content_type: &str, data: impl Into<Bytes>) -> ServiceResult<()> {
        let data = data.into();
        let length = data.len();

        self.http
            .put(
                &self.url,
                RequestConfig::new()
                    .header("x-ms-type", "file")
                    .header("x-ms-content-length", length.to_string())
                    .header("x-ms-content-type", content_type),
            )
            .await?;

        if length > 0 {
            self.http
                .put(
                    &self.url,
                    RequestConfig::new()
                        .query("comp", "range")
                        .header("x-ms-range", format!("bytes=0-{}", length - 1))
                        .header("x-ms-write", "update")
                        .body(data),
                )
                .await?;
        }

        info!(file = %self.name, size = length, "Uploaded file");
        Ok(())
    }

    /// Download the whole file
    pub async fn download(&self) -> ServiceResult<Bytes> {
        let response = self.http.get(&self.url, RequestConfig::new()).await?;
        Ok(response.bytes().await?)
    }

    /// Download the whole file as UTF-8 text
    pub async fn download_text(&self) -> ServiceResult<String> {
        let bytes = self.download().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ServiceError::malformed(format!("file '{}' is not UTF-8: {e}", self.name)))
    }

    /// Delete the file
    pub async fn delete(&self) -> ServiceResult<()> {
        self.http.delete(&self.url, RequestConfig::new()).await?;
        info!(file = %self.name, "Deleted file");
        Ok(())
    }
}

/// Fetches file and directory listing segments of one directory
#[derive(Debug, Clone)]
pub struct DirectoryListFetcher {
    http: Arc<HttpClient>,
    url: Url,
    options: ListOptions,
}

#[async_trait]
impl PageFetcher for DirectoryListFetcher {
    type Item = DirectoryEntryItem;

    async fn fetch_page(
        &self,
        token: &ContinuationToken,
    ) -> ServiceResult<Page<DirectoryEntryItem>> {
        let request = RequestConfig::new()
            .query("restype", "directory")
            .query("comp", "list")
            .query_opt("marker", token.as_marker())
            .query_opt("prefix", self.options.prefix.as_deref())
            .query_opt("maxresults", self.options.page_size.map(|n| n.to_string()));

        let body = self.http.request_text(Method::GET, &self.url, request).await?;
        parse_directory_page(&body)
    }
}
