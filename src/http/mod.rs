//! HTTP client module
//!
//! Transport for the storage service clients.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Credentials**: SAS query strings and bearer tokens, attached as given

mod client;
mod credential;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, DEFAULT_API_VERSION,
    ERROR_CODE_HEADER,
};
pub use credential::Credential;
