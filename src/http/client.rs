//! HTTP client with retry
//!
//! Provides the transport used by the blob and file service clients:
//! - Automatic retries with configurable backoff
//! - Credential attachment and service version headers
//! - Error classification into [`ServiceError`]
//!
//! Retries here are transport policy. The paginator itself never retries a
//! page; it only sees the final outcome of a request.

use super::credential::Credential;
use crate::error::{is_retryable_status, ServiceError, ServiceResult};
use crate::types::BackoffType;
use bytes::Bytes;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default storage service API version
pub const DEFAULT_API_VERSION: &str = "2021-08-06";

/// Header carrying the service error code
pub const ERROR_CODE_HEADER: &str = "x-ms-error-code";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
    /// Service API version sent as `x-ms-version`
    pub api_version: String,
    /// Credential attached to every request
    pub credential: Credential,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            default_headers: HashMap::new(),
            user_agent: format!("segstore/{}", env!("CARGO_PKG_VERSION")),
            api_version: DEFAULT_API_VERSION.to_string(),
            credential: Credential::Anonymous,
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the service API version
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the credential
    pub fn credential(mut self, credential: Credential) -> Self {
        self.config.credential = credential;
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: Option<Bytes>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override max retries for this request
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter when a value is present
    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// HTTP client with retry
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> ServiceResult<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Make a GET request
    pub async fn get(&self, url: &Url, config: RequestConfig) -> ServiceResult<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &Url, config: RequestConfig) -> ServiceResult<Response> {
        self.request(Method::PUT, url, config).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &Url, config: RequestConfig) -> ServiceResult<Response> {
        self.request(Method::DELETE, url, config).await
    }

    /// Make a generic request
    ///
    /// Non-success statuses are returned as [`ServiceError::Status`] with the
    /// service error code from the `x-ms-error-code` header.
    pub async fn request(
        &self,
        method: Method,
        url: &Url,
        config: RequestConfig,
    ) -> ServiceResult<Response> {
        let max_retries = config.max_retries.unwrap_or(self.config.max_retries);
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let mut last_error = None;
        let mut attempt = 0;

        while attempt <= max_retries {
            // Build request
            let mut req = self
                .client
                .request(method.clone(), url.clone())
                .header("x-ms-version", self.config.api_version.as_str());

            // Add default headers
            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }

            // Add request-specific headers
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }

            // Add query parameters
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }

            // Add body; PUTs without one still send a zero length
            match config.body {
                Some(ref body) => req = req.body(body.clone()),
                None if method == Method::PUT => req = req.body(Bytes::new()),
                None => {}
            }

            req = self.config.credential.apply(req.timeout(timeout));

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        debug!("Request succeeded: {} {}", method, url.path());
                        return Ok(response);
                    }

                    let error = status_error(response).await;

                    if is_retryable_status(status.as_u16()) && attempt < max_retries {
                        let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                            self.calculate_backoff(attempt).max(Duration::from_secs(1))
                        } else {
                            self.calculate_backoff(attempt)
                        };
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(error);
                        continue;
                    }

                    return Err(error);
                }
                Err(e) => {
                    let timeout_ms = timeout.as_millis() as u64;

                    if (e.is_timeout() || e.is_connect()) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request {}, attempt {}/{}, retrying in {:?}",
                            if e.is_timeout() { "timed out" } else { "could not connect" },
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(if e.is_timeout() {
                            ServiceError::Timeout { timeout_ms }
                        } else {
                            ServiceError::Http(e)
                        });
                        continue;
                    }

                    if e.is_timeout() {
                        return Err(ServiceError::Timeout { timeout_ms });
                    }
                    return Err(ServiceError::Http(e));
                }
            }
        }

        // Exhausted all retries
        Err(last_error.unwrap_or(ServiceError::MaxRetriesExceeded { max_retries }))
    }

    /// Make a request and read the whole body as text
    pub async fn request_text(
        &self,
        method: Method,
        url: &Url,
        config: RequestConfig,
    ) -> ServiceResult<String> {
        let response = self.request(method, url, config).await?;
        Ok(response.text().await?)
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Convert a non-success response into a service error
///
/// The `x-ms-error-code` header wins over the document's `<Code>`. A body that
/// is not an error document becomes the message as is.
async fn status_error(response: Response) -> ServiceError {
    let status = response.status().as_u16();
    let header_code = response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = response.text().await.unwrap_or_default();

    let (code, message) = match ErrorXml::parse(&body) {
        Some(doc) => (header_code.or(doc.code), doc.message.unwrap_or(body)),
        None => (header_code, body),
    };

    ServiceError::Status {
        status,
        code,
        message,
    }
}

/// Service error document: `<Error><Code/><Message/></Error>`
#[derive(Debug, Deserialize)]
struct ErrorXml {
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

impl ErrorXml {
    fn parse(body: &str) -> Option<Self> {
        let body = body.trim_start_matches('\u{feff}').trim_start();
        if !body.starts_with('<') {
            return None;
        }
        let doc: Self = quick_xml::de::from_str(body).ok()?;
        Some(Self {
            code: non_empty(doc.code),
            message: non_empty(doc.message),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
