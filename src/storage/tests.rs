//! Tests for storage module

use super::endpoint::child_url;
use super::xml::{parse_blob_page, parse_directory_page};
use super::*;
use crate::error::ServiceError;
use crate::pagination::{collect_all, ContinuationToken, PageFetcher, Paginator};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_case::test_case;
use url::Url;

// ============================================================================
// Endpoint Tests
// ============================================================================

#[test_case(DEFAULT_BLOB_ENDPOINT, "acct", "https://acct.blob.core.windows.net/" ; "host style blob")]
#[test_case(DEFAULT_FILE_ENDPOINT, "acct", "https://acct.file.core.windows.net/" ; "host style file")]
#[test_case("http://127.0.0.1:10000/{account}", "devstoreaccount1", "http://127.0.0.1:10000/devstoreaccount1" ; "path style")]
#[test_case("https://storage.internal/", "ignored", "https://storage.internal/" ; "no placeholder")]
fn test_endpoint_from_template(template: &str, account: &str, expected: &str) {
    let endpoint = ServiceEndpoint::from_template(template, account).unwrap();
    assert_eq!(endpoint.url().as_str(), expected);
}

#[test]
fn test_endpoint_requires_account_for_placeholder() {
    let err = ServiceEndpoint::from_template(DEFAULT_BLOB_ENDPOINT, "").unwrap_err();
    assert_eq!(err.to_string(), "Missing required config field: account_name");
}

#[test]
fn test_endpoint_rejects_invalid_url() {
    assert!(ServiceEndpoint::parse("not a url").is_err());
    assert!(ServiceEndpoint::parse("mailto:someone@example.com").is_err());
}

#[test_case("https://acct.blob.core.windows.net", "photos", "https://acct.blob.core.windows.net/photos" ; "host root")]
#[test_case("http://127.0.0.1:10000/acct", "photos", "http://127.0.0.1:10000/acct/photos" ; "path style")]
#[test_case("http://127.0.0.1:10000/acct/", "photos", "http://127.0.0.1:10000/acct/photos" ; "trailing slash")]
#[test_case("https://h/c", "2024/a b.jpg", "https://h/c/2024/a%20b.jpg" ; "nested name")]
fn test_child_url(base: &str, name: &str, expected: &str) {
    let base = Url::parse(base).unwrap();
    assert_eq!(child_url(&base, name).as_str(), expected);
}

// ============================================================================
// Blob Listing Decoding Tests
// ============================================================================

const BLOB_PAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.blob.core.windows.net/" ContainerName="photos">
  <MaxResults>2</MaxResults>
  <Blobs>
    <Blob>
      <Name>2024/a.jpg</Name>
      <Properties>
        <Last-Modified>Mon, 27 Jan 2025 10:00:00 GMT</Last-Modified>
        <Etag>0x8DD3F2C1</Etag>
        <Content-Length>1024</Content-Length>
        <Content-Type>image/jpeg</Content-Type>
        <BlobType>BlockBlob</BlobType>
      </Properties>
      <Metadata>
        <owner>ops</owner>
      </Metadata>
    </Blob>
    <Blob>
      <Name>b.txt</Name>
      <Properties>
        <Content-Length>0</Content-Length>
      </Properties>
    </Blob>
  </Blobs>
  <NextMarker>2!72!MDAwMDA</NextMarker>
</EnumerationResults>"#;

#[test]
fn test_parse_blob_page() {
    let page = parse_blob_page(BLOB_PAGE).unwrap();

    assert_eq!(page.next, ContinuationToken::marker("2!72!MDAwMDA"));
    assert_eq!(page.len(), 2);

    let first = &page.items[0];
    assert_eq!(first.name, "2024/a.jpg");
    assert_eq!(first.size(), Some(1024));
    assert_eq!(first.properties.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(first.properties.etag.as_deref(), Some("0x8DD3F2C1"));
    assert_eq!(first.properties.blob_type.as_deref(), Some("BlockBlob"));
    assert_eq!(
        first.properties.last_modified,
        Some(Utc.with_ymd_and_hms(2025, 1, 27, 10, 0, 0).unwrap())
    );
    assert_eq!(first.metadata.get("owner").map(String::as_str), Some("ops"));

    let second = &page.items[1];
    assert_eq!(second.name, "b.txt");
    assert_eq!(second.size(), Some(0));
    assert!(second.properties.last_modified.is_none());
    assert!(second.metadata.is_empty());
}

#[test]
fn test_parse_blob_page_last_and_empty() {
    let body = "<EnumerationResults><Blobs /><NextMarker /></EnumerationResults>";
    let page = parse_blob_page(body).unwrap();
    assert!(page.is_empty());
    assert!(page.is_last());

    let body = "<EnumerationResults><Blobs><Blob><Name>x</Name></Blob></Blobs></EnumerationResults>";
    let page = parse_blob_page(body).unwrap();
    assert_eq!(page.len(), 1);
    assert!(page.is_last());
}

#[test]
fn test_parse_blob_page_empty_with_marker() {
    let body = "<EnumerationResults><Blobs /><NextMarker>m7</NextMarker></EnumerationResults>";
    let page = parse_blob_page(body).unwrap();
    assert!(page.is_empty());
    assert_eq!(page.next, ContinuationToken::marker("m7"));
}

#[test]
fn test_parse_blob_page_strips_bom() {
    let body = "\u{feff}<EnumerationResults><Blobs><Blob><Name>x</Name></Blob></Blobs><NextMarker /></EnumerationResults>";
    let page = parse_blob_page(body).unwrap();
    assert_eq!(page.items[0].name, "x");
}

#[test]
fn test_parse_blob_page_malformed() {
    let missing_name =
        "<EnumerationResults><Blobs><Blob><Properties /></Blob></Blobs></EnumerationResults>";
    assert!(matches!(
        parse_blob_page(missing_name),
        Err(ServiceError::Malformed { .. })
    ));

    let bad_length = "<EnumerationResults><Blobs><Blob><Name>x</Name><Properties><Content-Length>lots</Content-Length></Properties></Blob></Blobs></EnumerationResults>";
    assert!(matches!(
        parse_blob_page(bad_length),
        Err(ServiceError::Malformed { .. })
    ));
}

// ============================================================================
// Directory Listing Decoding Tests
// ============================================================================

const DIRECTORY_PAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.file.core.windows.net/" ShareName="docs" DirectoryPath="">
  <Marker>m1</Marker>
  <Entries>
    <File>
      <Name>readme.md</Name>
      <Properties>
        <Content-Length>12</Content-Length>
      </Properties>
    </File>
    <Directory>
      <Name>reports</Name>
      <Properties />
    </Directory>
    <File>
      <Name>z.bin</Name>
      <Properties>
        <Content-Length>7</Content-Length>
      </Properties>
    </File>
  </Entries>
  <NextMarker />
</EnumerationResults>"#;

#[test]
fn test_parse_directory_page_keeps_entry_order() {
    let page = parse_directory_page(DIRECTORY_PAGE).unwrap();

    assert!(page.is_last());
    assert_eq!(
        page.items,
        vec![
            DirectoryEntryItem::file("readme.md", Some(12)),
            DirectoryEntryItem::directory("reports"),
            DirectoryEntryItem::file("z.bin", Some(7)),
        ]
    );
    assert!(page.items[1].is_directory());
}

#[test]
fn test_parse_directory_page_empty_with_marker() {
    let body = "<EnumerationResults><Entries /><NextMarker>next-1</NextMarker></EnumerationResults>";
    let page = parse_directory_page(body).unwrap();
    assert!(page.is_empty());
    assert_eq!(page.next, ContinuationToken::marker("next-1"));
}

// ============================================================================
// Object Store Listing Tests
// ============================================================================

async fn memory_store(keys: &[&str]) -> Arc<dyn ObjectStore> {
    let store = InMemory::new();
    for key in keys {
        store
            .put(&ObjectPath::from(*key), Bytes::from_static(b"data").into())
            .await
            .unwrap();
    }
    Arc::new(store)
}

#[tokio::test]
async fn test_store_fetcher_pages_by_last_key() {
    let store = memory_store(&["a", "b", "c", "d", "e"]).await;
    let fetcher = StoreListFetcher::new(store, None, 2);

    let first = fetcher.fetch_page(&ContinuationToken::Initial).await.unwrap();
    assert_eq!(
        first.items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    assert_eq!(first.next, ContinuationToken::marker("b"));
    assert_eq!(first.items[0].size(), Some(4));

    let collected = collect_all(Paginator::start(&fetcher)).await.unwrap();
    assert_eq!(collected.page_sizes(), vec![2, 2, 1]);
    assert_eq!(
        collected
            .into_items()
            .into_iter()
            .map(|i| i.name)
            .collect::<Vec<_>>(),
        vec!["a", "b", "c", "d", "e"]
    );
}

#[tokio::test]
async fn test_store_fetcher_full_last_page_ends_with_empty_page() {
    let store = memory_store(&["a", "b", "c"]).await;
    let fetcher = StoreListFetcher::new(store, None, 3);

    let collected = collect_all(Paginator::start(fetcher)).await.unwrap();
    assert_eq!(collected.page_sizes(), vec![3, 0]);
}

#[tokio::test]
async fn test_store_location_prefix_and_objects() {
    let location = StoreLocation::new(
        memory_store(&["logs/1", "logs/2", "other/3"]).await,
        "logs/",
        "memory",
    );
    assert_eq!(location.prefix(), "logs");
    assert!(!location.is_cloud());

    location.put("3", Bytes::from_static(b"third")).await.unwrap();
    assert_eq!(location.get("3").await.unwrap(), Bytes::from_static(b"third"));

    let collected = location.list(10).collect_pages().await.unwrap();
    assert_eq!(
        collected.items().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        vec!["logs/1", "logs/2", "logs/3"]
    );

    location.delete("1").await.unwrap();
    let err = location.get("1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_store_location_parse() {
    let memory = StoreLocation::parse("memory://scratch/").unwrap();
    assert_eq!(memory.scheme(), "memory");
    assert_eq!(memory.prefix(), "scratch");

    let temp_dir = tempfile::tempdir().unwrap();
    let local = StoreLocation::parse(temp_dir.path().to_str().unwrap()).unwrap();
    assert_eq!(local.scheme(), "file");
    assert!(!local.is_cloud());

    assert!(StoreLocation::parse("az://").is_err());
}

#[tokio::test]
async fn test_local_store_listing_is_sorted_and_complete() {
    let temp_dir = tempfile::tempdir().unwrap();
    let location = StoreLocation::parse(temp_dir.path().to_str().unwrap()).unwrap();
    assert!(!location.is_ordered());

    let expected: Vec<String> = (0..40).map(|i| format!("k{i:03}")).collect();
    for name in expected.iter().rev() {
        location.put(name, Bytes::from_static(b"x")).await.unwrap();
    }

    let mut listing = location.list(3);
    let mut names = Vec::new();
    while let Some(item) = listing.next_item().await {
        names.push(item.unwrap().name);
    }

    assert_eq!(names, expected);
    assert_eq!(listing.stats().pages_fetched, 14);
}

#[tokio::test]
async fn test_local_store_resumes_after_marker() {
    let temp_dir = tempfile::tempdir().unwrap();
    let location = StoreLocation::parse(temp_dir.path().to_str().unwrap()).unwrap();
    for i in 0..10 {
        location
            .put(&format!("k{i:02}"), Bytes::from_static(b"x"))
            .await
            .unwrap();
    }

    let resumed = Paginator::resume(location.fetcher(4), ContinuationToken::marker("k05"));
    let collected = collect_all(resumed).await.unwrap();

    assert_eq!(collected.page_sizes(), vec![4, 0]);
    assert_eq!(
        collected.items().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        vec!["k06", "k07", "k08", "k09"]
    );
}

#[tokio::test]
async fn test_memory_store_is_ordered() {
    let location = StoreLocation::new(memory_store(&["b", "a"]).await, "", "memory");
    assert!(location.is_ordered());
    let collected = location.list(1).collect_pages().await.unwrap();
    assert_eq!(collected.page_sizes(), vec![1, 1, 0]);
}
