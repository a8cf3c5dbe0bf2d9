//! Error types for segstore
//!
//! Two layers of errors live here:
//!
//! - [`ServiceError`] is what a storage service call can fail with. Page
//!   fetchers and single-object operations produce it.
//! - [`Error`] is the crate-wide error. A failed page fetch becomes
//!   [`Error::Fetch`], carrying the continuation token that was in use so the
//!   caller can resume the listing later.

use crate::pagination::ContinuationToken;
use thiserror::Error;

/// Failure reported by a remote storage service call
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}{}: {message}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Status {
        status: u16,
        /// Service error code, from the `x-ms-error-code` header when present
        code: Option<String>,
        message: String,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Malformed service response: {message}")]
    Malformed { message: String },

    #[error("Listing protocol violation: {message}")]
    Protocol { message: String },

    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ServiceError {
    /// Create a status error
    pub fn status(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            code,
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a protocol violation error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// HTTP status code, if the service answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Service error code (e.g. `ContainerNotFound`)
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if the addressed entity does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(object_store::Error::NotFound { .. }) => true,
            _ => self.status_code() == Some(404),
        }
    }

    /// Check if this error is retryable at the transport level
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for service calls
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// A page fetch failed
///
/// `token` is the continuation token that was passed to the failing fetch.
/// Starting a new enumeration from it with
/// [`Paginator::resume`](crate::pagination::Paginator::resume) retries that
/// exact page.
#[derive(Error, Debug)]
#[error("Page fetch failed at {token}: {source}")]
pub struct FetchError {
    pub token: ContinuationToken,
    #[source]
    pub source: ServiceError,
}

impl FetchError {
    /// Create a fetch error
    pub fn new(token: ContinuationToken, source: ServiceError) -> Self {
        Self { token, source }
    }
}

/// The main error type for segstore
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Listing cancelled at {token}")]
    Cancelled { token: ContinuationToken },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch(token: ContinuationToken, source: ServiceError) -> Self {
        Self::Fetch(FetchError::new(token, source))
    }

    /// Check if the listing was cancelled by the caller
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Check if this error wraps a service timeout
    pub fn is_timeout(&self) -> bool {
        self.service_error().is_some_and(ServiceError::is_timeout)
    }

    /// The underlying service error, if any
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(e) => Some(e),
            Self::Fetch(e) => Some(&e.source),
            _ => None,
        }
    }

    /// Token from which an interrupted listing can be resumed
    pub fn resume_token(&self) -> Option<&ContinuationToken> {
        match self {
            Self::Fetch(e) => Some(&e.token),
            Self::Cancelled { token } => Some(token),
            _ => None,
        }
    }
}

/// Result type alias for segstore
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
