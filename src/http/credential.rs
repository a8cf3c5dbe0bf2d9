//! Request credentials
//!
//! Credentials are opaque to segstore: a shared access signature is appended
//! to the query string as issued, a bearer token is sent as an
//! `Authorization` header. Nothing is signed locally.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential attached to every request
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "token", rename_all = "snake_case")]
pub enum Credential {
    /// Public access, nothing attached
    #[default]
    Anonymous,
    /// Shared access signature query string (with or without leading `?`)
    Sas(String),
    /// OAuth bearer token
    Bearer(String),
}

impl Credential {
    /// Create a SAS credential
    pub fn sas(token: impl Into<String>) -> Self {
        Self::Sas(token.into())
    }

    /// Create a bearer credential
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Check if no credential is attached
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Query pairs contributed by a SAS token
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::Sas(token) => url::form_urlencoded::parse(token.trim_start_matches('?').as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            Self::Anonymous | Self::Bearer(_) => Vec::new(),
        }
    }

    /// Attach this credential to a request
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Anonymous => req,
            Self::Sas(_) => req.query(&self.query_pairs()),
            Self::Bearer(token) => req.bearer_auth(token),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Sas(_) => f.write_str("Sas(<redacted>)"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}
