//! Listing item types
//!
//! The paginator is generic over its item type; these are the items the
//! bundled fetchers produce.

use crate::types::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options shared by every listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only list names starting with this prefix
    pub prefix: Option<String>,
    /// Upper bound on items per page (`maxresults`); service default if unset
    pub page_size: Option<u32>,
}

impl ListOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name prefix
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// System properties of a stored object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProperties {
    /// Size in bytes
    pub content_length: Option<u64>,
    /// MIME type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Last modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Service-specific object kind (e.g. `BlockBlob`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_type: Option<String>,
}

/// A blob-like object in a flat listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectItem {
    /// Full object name
    pub name: String,
    /// System properties
    pub properties: ObjectProperties,
    /// User metadata
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl ObjectItem {
    /// Create an item with empty properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: ObjectProperties::default(),
            metadata: Metadata::new(),
        }
    }

    /// Size in bytes, if reported
    pub fn size(&self) -> Option<u64> {
        self.properties.content_length
    }
}

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// A file or directory in a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntryItem {
    /// Entry name, relative to the listed directory
    pub name: String,
    /// File or directory
    pub kind: EntryKind,
    /// File size in bytes; not reported for directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
}

impl DirectoryEntryItem {
    /// Create a file entry
    pub fn file(name: impl Into<String>, content_length: Option<u64>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            content_length,
        }
    }

    /// Create a directory entry
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            content_length: None,
        }
    }

    /// Check if this entry is a directory
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
