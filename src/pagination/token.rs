//! Continuation token
//!
//! The marker a paginated listing API hands back so the caller can resume
//! where the previous page ended.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a listing resumes
///
/// The marker payload is opaque: it is passed back to the service verbatim
/// and only compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "marker", rename_all = "snake_case")]
pub enum ContinuationToken {
    /// Start of the listing, no marker sent
    #[default]
    Initial,
    /// Resume from this service-issued marker
    Marker(String),
    /// No more pages
    Terminal,
}

impl ContinuationToken {
    /// Create a marker token
    pub fn marker(value: impl Into<String>) -> Self {
        Self::Marker(value.into())
    }

    /// Map the service's "next marker" field to a token
    ///
    /// A missing or empty marker means the listing is complete.
    pub fn from_next_marker<S: Into<String>>(next: Option<S>) -> Self {
        match next.map(Into::into) {
            Some(marker) if !marker.is_empty() => Self::Marker(marker),
            _ => Self::Terminal,
        }
    }

    /// Marker value to send with the next request, if any
    pub fn as_marker(&self) -> Option<&str> {
        match self {
            Self::Marker(marker) => Some(marker),
            Self::Initial | Self::Terminal => None,
        }
    }

    /// Check if this is the start of a listing
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Initial)
    }

    /// Check if the listing is complete
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Check if more pages may follow
    pub fn not_done(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => f.write_str("initial"),
            Self::Marker(marker) => write!(f, "marker '{marker}'"),
            Self::Terminal => f.write_str("terminal"),
        }
    }
}
