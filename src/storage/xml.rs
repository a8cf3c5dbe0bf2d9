//! Listing response decoding
//!
//! Both listing calls answer with an `EnumerationResults` document. Only the
//! fields the items need are mapped; everything else is ignored.

use super::types::{DirectoryEntryItem, ObjectItem, ObjectProperties};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{ContinuationToken, Page};
use crate::types::Metadata;
use chrono::{DateTime, Utc};
use serde::Deserialize;

// ============================================================================
// Blob listing
// ============================================================================

#[derive(Debug, Deserialize)]
struct BlobEnumerationXml {
    #[serde(rename = "Blobs", default)]
    blobs: BlobsXml,
    #[serde(rename = "NextMarker", default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BlobsXml {
    #[serde(rename = "Blob", default)]
    blob: Vec<BlobXml>,
}

#[derive(Debug, Deserialize)]
struct BlobXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties", default)]
    properties: BlobPropertiesXml,
    #[serde(rename = "Metadata", default)]
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct BlobPropertiesXml {
    #[serde(rename = "Content-Length", default)]
    content_length: Option<String>,
    #[serde(rename = "Content-Type", default)]
    content_type: Option<String>,
    #[serde(rename = "Last-Modified", default)]
    last_modified: Option<String>,
    #[serde(rename = "Etag", default)]
    etag: Option<String>,
    #[serde(rename = "BlobType", default)]
    blob_type: Option<String>,
}

impl BlobXml {
    fn into_item(self) -> ServiceResult<ObjectItem> {
        let props = self.properties;
        Ok(ObjectItem {
            properties: ObjectProperties {
                content_length: parse_length(props.content_length, &self.name)?,
                content_type: non_empty(props.content_type),
                last_modified: parse_http_date(props.last_modified, &self.name)?,
                etag: non_empty(props.etag),
                blob_type: non_empty(props.blob_type),
            },
            name: self.name,
            metadata: self.metadata,
        })
    }
}

/// Decode one page of a container blob listing
pub(crate) fn parse_blob_page(body: &str) -> ServiceResult<Page<ObjectItem>> {
    let doc: BlobEnumerationXml = decode(body)?;
    let items = doc
        .blobs
        .blob
        .into_iter()
        .map(BlobXml::into_item)
        .collect::<ServiceResult<Vec<_>>>()?;
    Ok(Page::new(
        items,
        ContinuationToken::from_next_marker(doc.next_marker),
    ))
}

// ============================================================================
// Directory listing
// ============================================================================

#[derive(Debug, Deserialize)]
struct DirectoryEnumerationXml {
    #[serde(rename = "Entries", default)]
    entries: EntriesXml,
    #[serde(rename = "NextMarker", default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EntriesXml {
    #[serde(rename = "$value", default)]
    entries: Vec<EntryXml>,
}

#[derive(Debug, Deserialize)]
enum EntryXml {
    File(FileXml),
    Directory(NamedXml),
}

#[derive(Debug, Deserialize)]
struct FileXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties", default)]
    properties: FilePropertiesXml,
}

#[derive(Debug, Default, Deserialize)]
struct FilePropertiesXml {
    #[serde(rename = "Content-Length", default)]
    content_length: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedXml {
    #[serde(rename = "Name")]
    name: String,
}

/// Decode one page of a share directory listing
pub(crate) fn parse_directory_page(body: &str) -> ServiceResult<Page<DirectoryEntryItem>> {
    let doc: DirectoryEnumerationXml = decode(body)?;
    let items = doc
        .entries
        .entries
        .into_iter()
        .map(|entry| match entry {
            EntryXml::File(file) => {
                let length = parse_length(file.properties.content_length, &file.name)?;
                Ok(DirectoryEntryItem::file(file.name, length))
            }
            EntryXml::Directory(dir) => Ok(DirectoryEntryItem::directory(dir.name)),
        })
        .collect::<ServiceResult<Vec<_>>>()?;
    Ok(Page::new(
        items,
        ContinuationToken::from_next_marker(doc.next_marker),
    ))
}

// ============================================================================
// Helpers
// ============================================================================

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> ServiceResult<T> {
    let body = body.trim_start_matches('\u{feff}').trim_start();
    quick_xml::de::from_str(body)
        .map_err(|e| ServiceError::malformed(format!("listing response: {e}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_length(value: Option<String>, name: &str) -> ServiceResult<Option<u64>> {
    non_empty(value)
        .map(|v| {
            v.trim().parse::<u64>().map_err(|e| {
                ServiceError::malformed(format!("Content-Length '{v}' of '{name}': {e}"))
            })
        })
        .transpose()
}

/// Parse an RFC 1123 date such as `Mon, 27 Jan 2025 10:00:00 GMT`
fn parse_http_date(value: Option<String>, name: &str) -> ServiceResult<Option<DateTime<Utc>>> {
    non_empty(value)
        .map(|v| {
            DateTime::parse_from_rfc2822(v.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ServiceError::malformed(format!("Last-Modified '{v}' of '{name}': {e}")))
        })
        .transpose()
}
