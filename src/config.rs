//! Storage account configuration
//!
//! A [`StorageConfig`] names the account, its service endpoints, the
//! credential and the transport settings. It is loaded from YAML or JSON and
//! can be overridden from `SEGSTORE_*` environment variables.

use crate::error::{Error, Result};
use crate::http::{Credential, HttpClientConfig, DEFAULT_API_VERSION};
use crate::storage::{ListOptions, ServiceEndpoint, DEFAULT_BLOB_ENDPOINT, DEFAULT_FILE_ENDPOINT};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Largest page size the listing calls accept
pub const MAX_PAGE_SIZE: u32 = 5000;

/// Environment variable overriding the account name
pub const ENV_ACCOUNT: &str = "SEGSTORE_ACCOUNT";
/// Environment variable carrying a SAS token
pub const ENV_SAS_TOKEN: &str = "SEGSTORE_SAS_TOKEN";
/// Environment variable carrying a bearer token
pub const ENV_BEARER_TOKEN: &str = "SEGSTORE_BEARER_TOKEN";
/// Environment variable overriding the blob endpoint template
pub const ENV_BLOB_ENDPOINT: &str = "SEGSTORE_BLOB_ENDPOINT";
/// Environment variable overriding the file endpoint template
pub const ENV_FILE_ENDPOINT: &str = "SEGSTORE_FILE_ENDPOINT";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete account configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage account name
    #[serde(default)]
    pub account_name: String,

    /// Blob service endpoint template
    #[serde(default = "default_blob_endpoint")]
    pub blob_endpoint: String,

    /// File service endpoint template
    #[serde(default = "default_file_endpoint")]
    pub file_endpoint: String,

    /// Credential attached to requests
    #[serde(default)]
    pub credential: Credential,

    /// Service API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Listing defaults
    #[serde(default)]
    pub listing: ListingConfig,
}

fn default_blob_endpoint() -> String {
    DEFAULT_BLOB_ENDPOINT.to_string()
}

fn default_file_endpoint() -> String {
    DEFAULT_FILE_ENDPOINT.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_name: String::new(),
            blob_endpoint: default_blob_endpoint(),
            file_endpoint: default_file_endpoint(),
            credential: Credential::Anonymous,
            api_version: default_api_version(),
            http: HttpConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Backoff configuration for retries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Backoff type
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60_000
}

// ============================================================================
// Listing Config
// ============================================================================

/// Listing defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Items per page; the service default when unset
    #[serde(default)]
    pub page_size: Option<u32>,
}

// ============================================================================
// Loading
// ============================================================================

impl StorageConfig {
    /// Config for an account with default endpoints
    pub fn for_account(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            ..Self::default()
        }
    }

    /// Load a config file, choosing the format by extension
    ///
    /// `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse a YAML config
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `SEGSTORE_*` environment overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    ///
    /// A bearer token wins over a SAS token when both are set.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(account) = lookup(ENV_ACCOUNT) {
            self.account_name = account;
        }
        if let Some(endpoint) = lookup(ENV_BLOB_ENDPOINT) {
            self.blob_endpoint = endpoint;
        }
        if let Some(endpoint) = lookup(ENV_FILE_ENDPOINT) {
            self.file_endpoint = endpoint;
        }
        if let Some(token) = lookup(ENV_SAS_TOKEN) {
            self.credential = Credential::sas(token);
        }
        if let Some(token) = lookup(ENV_BEARER_TOKEN) {
            self.credential = Credential::bearer(token);
        }
        self
    }

    /// Check the config for missing or out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.account_name.is_empty() {
            return Err(Error::missing_field("account_name"));
        }
        if self.api_version.is_empty() {
            return Err(Error::missing_field("api_version"));
        }
        if self.http.timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "http.timeout_seconds",
                "must be greater than zero",
            ));
        }
        if self.http.retry_backoff.initial_ms > self.http.retry_backoff.max_ms {
            return Err(Error::invalid_value(
                "http.retry_backoff",
                "initial_ms must not exceed max_ms",
            ));
        }
        if let Some(size) = self.listing.page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&size) {
                return Err(Error::invalid_value(
                    "listing.page_size",
                    format!("{size} is outside 1..={MAX_PAGE_SIZE}"),
                ));
            }
        }

        self.blob_endpoint()?;
        self.file_endpoint()?;
        Ok(())
    }

    /// Resolved blob service endpoint
    pub fn blob_endpoint(&self) -> Result<ServiceEndpoint> {
        ServiceEndpoint::from_template(&self.blob_endpoint, &self.account_name)
    }

    /// Resolved file service endpoint
    pub fn file_endpoint(&self) -> Result<ServiceEndpoint> {
        ServiceEndpoint::from_template(&self.file_endpoint, &self.account_name)
    }

    /// Transport configuration for the HTTP client
    pub fn http_client_config(&self) -> HttpClientConfig {
        let backoff = &self.http.retry_backoff;
        HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .backoff(
                backoff.backoff_type,
                Duration::from_millis(backoff.initial_ms),
                Duration::from_millis(backoff.max_ms),
            )
            .api_version(self.api_version.as_str())
            .credential(self.credential.clone())
            .build()
    }

    /// Default listing options
    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            prefix: None,
            page_size: self.listing.page_size,
        }
    }
}
