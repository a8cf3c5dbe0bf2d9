//! Tests for pagination module

use super::*;
use crate::error::{Error, FetchError, ServiceError, ServiceResult};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Scripted fetcher
// ============================================================================

enum Step {
    Page(Vec<&'static str>, ContinuationToken),
    Fail(ServiceError),
    Hang,
}

/// Replays a fixed sequence of responses and records the tokens it was given
#[derive(Default)]
struct ScriptedFetcher {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<ContinuationToken>>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn page(self, items: &[&'static str], next: ContinuationToken) -> Self {
        self.steps
            .lock()
            .unwrap()
            .push_back(Step::Page(items.to_vec(), next));
        self
    }

    fn fail(self, error: ServiceError) -> Self {
        self.steps.lock().unwrap().push_back(Step::Fail(error));
        self
    }

    fn hang(self) -> Self {
        self.steps.lock().unwrap().push_back(Step::Hang);
        self
    }

    fn calls(&self) -> Vec<ContinuationToken> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    type Item = String;

    async fn fetch_page(&self, token: &ContinuationToken) -> ServiceResult<Page<String>> {
        self.calls.lock().unwrap().push(token.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("fetched past the end of the script");

        match step {
            Step::Page(items, next) => Ok(Page::new(
                items.into_iter().map(String::from).collect(),
                next,
            )),
            Step::Fail(error) => Err(error),
            Step::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn m(marker: &str) -> ContinuationToken {
    ContinuationToken::marker(marker)
}

const T: ContinuationToken = ContinuationToken::Terminal;

async fn drain<F: PageFetcher<Item = String>>(
    paginator: &mut Paginator<F>,
) -> (Vec<String>, Option<Error>) {
    let mut items = Vec::new();
    while let Some(next) = paginator.next_item().await {
        match next {
            Ok(item) => items.push(item),
            Err(e) => return (items, Some(e)),
        }
    }
    (items, None)
}

// ============================================================================
// Paginator Tests
// ============================================================================

#[tokio::test]
async fn test_example_scenario() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page(&["a", "b"], m("token1"))
            .page(&[], m("token2"))
            .page(&["c"], T),
    );

    let mut paginator = Paginator::start(fetcher.clone());
    let (items, error) = drain(&mut paginator).await;

    assert!(error.is_none());
    assert_eq!(items, vec!["a", "b", "c"]);
    assert_eq!(
        fetcher.calls(),
        vec![ContinuationToken::Initial, m("token1"), m("token2")]
    );
}

#[tokio::test]
async fn test_never_fetches_past_terminal() {
    let fetcher = Arc::new(ScriptedFetcher::new().page(&["only"], T));
    let mut paginator = Paginator::start(fetcher.clone());

    assert_eq!(paginator.next_item().await.unwrap().unwrap(), "only");
    assert!(paginator.next_item().await.is_none());
    assert!(paginator.next_item().await.is_none());
    assert!(paginator.next_page().await.is_none());
    assert!(paginator.is_finished());
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_preserves_page_and_item_order() {
    let fetcher = ScriptedFetcher::new()
        .page(&["p0-0", "p0-1", "p0-2"], m("1"))
        .page(&["p1-0"], m("2"))
        .page(&["p2-0", "p2-1"], m("3"))
        .page(&["p3-0"], T);

    let mut paginator = Paginator::start(&fetcher);
    let (items, error) = drain(&mut paginator).await;

    assert!(error.is_none());
    assert_eq!(
        items,
        vec!["p0-0", "p0-1", "p0-2", "p1-0", "p2-0", "p2-1", "p3-0"]
    );
    assert_eq!(
        paginator.stats(),
        ListingStats {
            pages_fetched: 4,
            items_fetched: 7
        }
    );
}

#[tokio::test]
async fn test_empty_page_with_marker_continues() {
    let fetcher = ScriptedFetcher::new()
        .page(&[], m("m1"))
        .page(&[], m("m2"))
        .page(&["x"], T);

    let mut paginator = Paginator::start(&fetcher);

    assert_eq!(paginator.next_item().await.unwrap().unwrap(), "x");
    assert!(paginator.next_item().await.is_none());
    assert_eq!(
        fetcher.calls(),
        vec![ContinuationToken::Initial, m("m1"), m("m2")]
    );
}

#[tokio::test]
async fn test_empty_listing() {
    let fetcher = ScriptedFetcher::new().page(&[], T);
    let mut paginator = Paginator::start(&fetcher);

    assert!(paginator.next_item().await.is_none());
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_surfaces_token_of_failing_call() {
    let fetcher = ScriptedFetcher::new()
        .page(&["a", "b"], m("m1"))
        .page(&["c"], m("m2"))
        .fail(ServiceError::status(503, Some("ServerBusy".into()), "busy"));

    let mut paginator = Paginator::start(&fetcher);
    let (items, error) = drain(&mut paginator).await;

    assert_eq!(items, vec!["a", "b", "c"]);
    match error {
        Some(Error::Fetch(FetchError { token, source })) => {
            assert_eq!(token, m("m2"));
            assert_eq!(source.status_code(), Some(503));
            assert_eq!(source.error_code(), Some("ServerBusy"));
        }
        other => panic!("Expected fetch error, got {other:?}"),
    }

    // The failure is terminal for this enumeration
    assert!(paginator.next_item().await.is_none());
    assert!(paginator.is_finished());
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test]
async fn test_first_fetch_failure_yields_no_items() {
    let fetcher = ScriptedFetcher::new().fail(ServiceError::status(403, None, "denied"));
    let mut paginator = Paginator::start(&fetcher);
    let (items, error) = drain(&mut paginator).await;

    assert!(items.is_empty());
    let error = error.expect("expected an error");
    assert_eq!(error.resume_token(), Some(&ContinuationToken::Initial));
}

#[tokio::test]
async fn test_timeout_surfaces_unchanged() {
    let fetcher = ScriptedFetcher::new().fail(ServiceError::Timeout { timeout_ms: 500 });
    let mut paginator = Paginator::start(&fetcher);

    let error = paginator.next_item().await.unwrap().unwrap_err();
    assert!(error.is_timeout());
    assert!(matches!(
        error,
        Error::Fetch(FetchError {
            source: ServiceError::Timeout { timeout_ms: 500 },
            ..
        })
    ));
}

#[tokio::test]
async fn test_resume_from_failure_token() {
    let failing = ScriptedFetcher::new()
        .page(&["a"], m("m1"))
        .fail(ServiceError::Timeout { timeout_ms: 10 });
    let mut first = Paginator::start(&failing);
    let (items, error) = drain(&mut first).await;
    assert_eq!(items, vec!["a"]);
    let token = error.unwrap().resume_token().cloned().unwrap();

    let healthy = ScriptedFetcher::new().page(&["b", "c"], T);
    let mut resumed = Paginator::resume(&healthy, token);
    let (items, error) = drain(&mut resumed).await;

    assert!(error.is_none());
    assert_eq!(items, vec!["b", "c"]);
    assert_eq!(healthy.calls(), vec![m("m1")]);
}

#[tokio::test]
async fn test_resume_from_terminal_fetches_nothing() {
    let fetcher = ScriptedFetcher::new();
    let mut paginator = Paginator::resume(&fetcher, T);

    assert!(paginator.is_finished());
    assert!(paginator.next_item().await.is_none());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_initial_token_as_next_is_rejected() {
    let fetcher = ScriptedFetcher::new().page(&["a"], ContinuationToken::Initial);
    let mut paginator = Paginator::start(&fetcher);

    let error = paginator.next_item().await.unwrap().unwrap_err();
    assert!(matches!(
        error,
        Error::Fetch(FetchError {
            source: ServiceError::Protocol { .. },
            ..
        })
    ));
    // All-or-nothing: the rejected page's items are not delivered
    assert!(paginator.next_item().await.is_none());
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_start() {
    let fetcher = ScriptedFetcher::new().page(&["a"], T);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut paginator = Paginator::start(&fetcher).with_cancellation(cancel);
    let error = paginator.next_item().await.unwrap().unwrap_err();

    assert!(error.is_cancelled());
    assert_eq!(error.resume_token(), Some(&ContinuationToken::Initial));
    assert!(paginator.next_item().await.is_none());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::new().page(&["a"], m("m1")).hang());
    let cancel = CancellationToken::new();
    let mut paginator = Paginator::start(fetcher.clone()).with_cancellation(cancel.clone());

    assert_eq!(paginator.next_item().await.unwrap().unwrap(), "a");

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let next = tokio::time::timeout(Duration::from_secs(5), paginator.next_item())
        .await
        .expect("cancellation did not interrupt the fetch");
    canceller.await.unwrap();

    match next {
        Some(Err(Error::Cancelled { token })) => assert_eq!(token, m("m1")),
        other => panic!("Expected cancellation, got {other:?}"),
    }
    assert!(paginator.next_item().await.is_none());
    assert_eq!(fetcher.calls(), vec![ContinuationToken::Initial, m("m1")]);
}

#[tokio::test]
async fn test_cancel_delivers_buffered_items_first() {
    let fetcher = ScriptedFetcher::new()
        .page(&["a", "b"], m("m1"))
        .page(&["c"], T);
    let cancel = CancellationToken::new();
    let mut paginator = Paginator::start(&fetcher).with_cancellation(cancel.clone());

    assert_eq!(paginator.next_item().await.unwrap().unwrap(), "a");
    cancel.cancel();

    let (items, error) = drain(&mut paginator).await;
    assert_eq!(items, vec!["b"]);
    assert_eq!(error.unwrap().resume_token(), Some(&m("m1")));
    assert_eq!(fetcher.calls().len(), 1);
}

// ============================================================================
// Stream Adapter Tests
// ============================================================================

#[tokio::test]
async fn test_into_stream() {
    let fetcher = ScriptedFetcher::new()
        .page(&["a"], m("m1"))
        .page(&["b"], T);

    let items: Vec<String> = Paginator::start(&fetcher)
        .into_stream()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items, vec!["a", "b"]);
}

#[tokio::test]
async fn test_into_stream_ends_after_error() {
    let fetcher = ScriptedFetcher::new()
        .page(&["a"], m("m1"))
        .fail(ServiceError::malformed("truncated body"));

    let results: Vec<_> = Paginator::start(&fetcher).into_stream().collect().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), "a");
    assert!(results[1].is_err());
}

#[tokio::test]
async fn test_into_pages_keeps_empty_pages() {
    let fetcher = ScriptedFetcher::new()
        .page(&["a", "b"], m("m1"))
        .page(&[], m("m2"))
        .page(&["c"], T);

    let pages: Vec<Vec<String>> = Paginator::start(&fetcher)
        .into_pages()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages, vec![vec!["a", "b"], vec![], vec!["c"]]);
}

#[tokio::test]
async fn test_next_page_returns_rest_of_current_page() {
    let fetcher = ScriptedFetcher::new()
        .page(&["a", "b", "c"], m("m1"))
        .page(&["d"], T);
    let mut paginator = Paginator::start(&fetcher);

    assert_eq!(paginator.next_item().await.unwrap().unwrap(), "a");
    assert_eq!(paginator.next_page().await.unwrap().unwrap(), vec!["b", "c"]);
    assert_eq!(paginator.next_page().await.unwrap().unwrap(), vec!["d"]);
    assert!(paginator.next_page().await.is_none());
}

#[tokio::test]
async fn test_concurrent_enumerations_are_independent() {
    let left = ScriptedFetcher::new()
        .page(&["l1"], m("l-next"))
        .page(&["l2"], T);
    let right = ScriptedFetcher::new()
        .page(&["r1", "r2"], m("r-next"))
        .page(&[], m("r-last"))
        .page(&["r3"], T);

    let (left_items, right_items) = tokio::join!(
        Paginator::start(&left).into_stream().try_collect::<Vec<_>>(),
        Paginator::start(&right).into_stream().try_collect::<Vec<_>>(),
    );

    assert_eq!(left_items.unwrap(), vec!["l1", "l2"]);
    assert_eq!(right_items.unwrap(), vec!["r1", "r2", "r3"]);
    assert_eq!(left.calls(), vec![ContinuationToken::Initial, m("l-next")]);
    assert_eq!(
        right.calls(),
        vec![ContinuationToken::Initial, m("r-next"), m("r-last")]
    );
}

// ============================================================================
// Accumulator Tests
// ============================================================================

fn three_page_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .page(&["a", "b"], m("m1"))
        .page(&[], m("m2"))
        .page(&["c", "d", "e"], T)
}

#[tokio::test]
async fn test_collect_all_keeps_page_boundaries() {
    let collected = collect_all(Paginator::start(three_page_fetcher()))
        .await
        .unwrap();

    assert_eq!(collected.page_sizes(), vec![2, 0, 3]);
    assert_eq!(collected.page_count(), 3);
    assert_eq!(collected.item_count(), 5);
    assert_eq!(
        collected.pages().iter().map(|p| p.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(collected.pages()[1].is_empty());

    let mut direct = Paginator::start(three_page_fetcher());
    let (direct_items, error) = drain(&mut direct).await;
    assert!(error.is_none());
    assert_eq!(collected.into_items(), direct_items);
}

#[tokio::test]
async fn test_collect_all_keeps_partial_results() {
    let fetcher = ScriptedFetcher::new()
        .page(&["a", "b"], m("m1"))
        .page(&["c"], m("m2"))
        .fail(ServiceError::status(500, None, "internal"));

    let partial = Paginator::start(&fetcher).collect_pages().await.unwrap_err();

    assert_eq!(partial.collected.page_sizes(), vec![2, 1]);
    assert_eq!(
        partial.collected.items().cloned().collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
    assert_eq!(partial.error.resume_token(), Some(&m("m2")));
    assert!(partial
        .to_string()
        .starts_with("listing stopped after 2 page(s)"));

    let error: Error = partial.into();
    assert!(matches!(error, Error::Fetch(_)));
}

#[tokio::test]
async fn test_collect_all_empty_listing() {
    let fetcher = ScriptedFetcher::new().page(&[], T);
    let collected = collect_all(Paginator::start(&fetcher)).await.unwrap();

    assert_eq!(collected.page_sizes(), vec![0]);
    assert_eq!(collected.item_count(), 0);
}

// ============================================================================
// Page Tests
// ============================================================================

#[test]
fn test_page_helpers() {
    let page = Page::new(vec![1, 2], m("next"));
    assert_eq!(page.len(), 2);
    assert!(!page.is_empty());
    assert!(!page.is_last());

    let last: Page<u8> = Page::last(vec![]);
    assert!(last.is_empty());
    assert!(last.is_last());
    assert_eq!(last.into_parts(), (vec![], T));
}
