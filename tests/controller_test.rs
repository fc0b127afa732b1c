use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use rostercli::error::{ApiError, ControlError, FilterError};
use rostercli::management::{
    ListOptions, ListQueryController, LoadOutcome, PageSource, QuerySignature, ViewErrorKind,
};
use rostercli::types::{ListResponse, PageMeta};
use tokio::time::{advance, sleep};

const KEYS: &[&str] = &["major", "university", "city"];

/// In-memory catalog of 23 items per query. Items are tagged with the
/// signature they were produced for.
struct FakeSource {
    total: u64,
    calls: Mutex<Vec<QuerySignature>>,
    completed: AtomicUsize,
    delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<VecDeque<ApiError>>,
    max_limit: Mutex<Option<u32>>,
}

impl FakeSource {
    fn new(total: u64) -> Self {
        Self {
            total,
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            delays: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            max_limit: Mutex::new(None),
        }
    }

    /// Serve at most `limit` items per page, whatever was asked for.
    fn clamp_limit(&self, limit: u32) {
        *self.max_limit.lock().unwrap() = Some(limit);
    }

    fn delay_major(&self, major: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(major.to_string(), delay);
    }

    fn fail_next(&self, err: ApiError) {
        self.failures.lock().unwrap().push_back(err);
    }

    fn calls(&self) -> Vec<QuerySignature> {
        self.calls.lock().unwrap().clone()
    }

    fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn delay_for(&self, signature: &QuerySignature) -> Duration {
        let major = signature
            .active_filters()
            .find(|(key, _)| *key == "major")
            .map(|(_, value)| value.to_string());
        major
            .and_then(|m| self.delays.lock().unwrap().get(&m).copied())
            .unwrap_or(Duration::from_millis(10))
    }
}

impl PageSource for FakeSource {
    type Item = String;

    async fn fetch_page(
        &self,
        signature: &QuerySignature,
    ) -> Result<ListResponse<String>, ApiError> {
        self.calls.lock().unwrap().push(signature.clone());
        let delay = self.delay_for(signature);
        sleep(delay).await;

        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        let page = signature.page();
        let max_limit = *self.max_limit.lock().unwrap();
        let limit = max_limit.map_or(signature.limit(), |max| signature.limit().min(max));
        let start = u64::from(page - 1) * u64::from(limit);
        let end = (start + u64::from(limit)).min(self.total);
        let data = (start..end).map(|i| format!("{signature}#{i}")).collect();

        Ok(ListResponse {
            data,
            pagination: PageMeta {
                page,
                limit,
                total: self.total,
                total_pages: None,
            },
        })
    }
}

fn controller(total: u64) -> ListQueryController<FakeSource> {
    ListQueryController::new(
        FakeSource::new(total),
        KEYS,
        ListOptions {
            page_size: 9,
            debounce: Duration::from_millis(500),
            cache_ttl: None,
        },
    )
}

// Lets the debouncer task catch up with what was pushed.
async fn settle_tasks() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

fn all_from(results: &[String], signature: &QuerySignature) -> bool {
    let prefix = format!("{signature}#");
    !results.is_empty() && results.iter().all(|r| r.starts_with(&prefix))
}

#[tokio::test(start_paused = true)]
async fn test_identical_query_is_served_from_cache() {
    let view = controller(23);

    assert_eq!(view.load().await, Ok(LoadOutcome::Fetched));
    let first = view.results();
    assert_eq!(view.source().calls().len(), 1);

    assert_eq!(view.load().await, Ok(LoadOutcome::Cached));
    assert_eq!(view.source().calls().len(), 1);
    assert_eq!(view.results(), first);
}

#[tokio::test(start_paused = true)]
async fn test_pagination_recomputed_from_response() {
    let view = controller(23);
    view.load().await.unwrap();

    let pagination = view.pagination();
    assert_eq!(pagination.page, 1);
    assert_eq!(pagination.limit, 9);
    assert_eq!(pagination.total, 23);
    assert_eq!(pagination.total_pages, 3);
    assert_eq!(view.results().len(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_go_to_page_ignores_out_of_range() {
    let view = controller(23);
    view.load().await.unwrap();

    assert_eq!(view.go_to_page(4).await, Ok(LoadOutcome::Unchanged));
    assert_eq!(view.go_to_page(0).await, Ok(LoadOutcome::Unchanged));
    assert_eq!(view.pagination().page, 1);
    assert_eq!(view.source().calls().len(), 1);

    assert_eq!(view.go_to_page(3).await, Ok(LoadOutcome::Fetched));
    assert_eq!(view.pagination().page, 3);
    assert_eq!(view.results().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_page_navigation_reuses_cached_pages() {
    let view = controller(23);
    view.load().await.unwrap();

    assert_eq!(view.next_page().await, Ok(LoadOutcome::Fetched));
    assert_eq!(view.prev_page().await, Ok(LoadOutcome::Cached));
    assert_eq!(view.next_page().await, Ok(LoadOutcome::Cached));
    assert_eq!(view.source().calls().len(), 2);
    assert_eq!(view.cached_pages(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_total_zero_still_has_one_page() {
    let view = controller(0);
    view.load().await.unwrap();

    assert!(view.results().is_empty());
    assert_eq!(view.pagination().total_pages, 1);
    assert_eq!(view.next_page().await, Ok(LoadOutcome::Unchanged));
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_resets_page_and_discards_cache() {
    let view = controller(23);
    view.load().await.unwrap();
    view.go_to_page(3).await.unwrap();
    assert_eq!(view.cached_pages(), 2);

    assert_eq!(
        view.set_filter("major", "CS").await,
        Ok(LoadOutcome::Fetched)
    );
    assert_eq!(view.pagination().page, 1);
    assert_eq!(view.cached_pages(), 1);
    assert!(all_from(&view.results(), &view.signature()));

    // back to the unfiltered query: fetched again, the old page is gone
    assert_eq!(view.clear_filter("major").await, Ok(LoadOutcome::Fetched));
    assert_eq!(view.source().calls().len(), 4);
    assert_eq!(view.pagination().page, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_filter_does_not_fetch() {
    let view = controller(23);
    view.set_filter("major", "CS").await.unwrap();

    assert_eq!(
        view.set_filter("major", " CS ").await,
        Ok(LoadOutcome::Unchanged)
    );
    assert_eq!(view.source().calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_filter_is_rejected_without_fetching() {
    let view = controller(23);

    let err = view.set_filter("salary", "high").await.unwrap_err();
    assert!(matches!(
        err,
        ControlError::Filter(FilterError::UnknownKey { .. })
    ));
    assert!(view.source().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_old_page_never_shown_under_new_filter() {
    let view = controller(23);
    view.load().await.unwrap();
    view.go_to_page(3).await.unwrap();
    view.source().delay_major("CS", Duration::from_millis(200));

    let (outcome, during) = tokio::join!(view.set_filter("major", "CS"), async {
        tokio::task::yield_now().await;
        view.snapshot()
    });

    // while the new query is in flight nothing from page 3 is visible
    assert!(during.loading);
    assert!(during.results.is_empty());
    assert_eq!(during.pagination.page, 1);

    assert_eq!(outcome, Ok(LoadOutcome::Fetched));
    assert!(all_from(&view.results(), &view.signature()));
    assert!(!view.loading());
}

#[tokio::test(start_paused = true)]
async fn test_latest_filter_wins_over_slower_response() {
    let view = controller(23);
    view.source().delay_major("Physics", Duration::from_millis(300));
    view.source().delay_major("CS", Duration::from_millis(50));

    let (slow, fast) = tokio::join!(view.set_filter("major", "Physics"), async {
        tokio::task::yield_now().await;
        view.set_filter("major", "CS").await
    });

    assert_eq!(slow, Ok(LoadOutcome::Superseded));
    assert_eq!(fast, Ok(LoadOutcome::Fetched));

    // give the slow request every chance to land
    advance(Duration::from_secs(1)).await;

    assert_eq!(view.source().calls().len(), 2);
    assert_eq!(view.source().completed(), 1);
    assert!(all_from(&view.results(), &view.signature()));
    assert!(view.results()[0].contains("major=CS"));
    assert_eq!(view.cached_pages(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_query_is_not_cached() {
    let view = controller(23);
    view.source().delay_major("Physics", Duration::from_millis(300));

    let _ = tokio::join!(view.set_filter("major", "Physics"), async {
        tokio::task::yield_now().await;
        view.set_filter("major", "CS").await
    });

    // returning to the abandoned filter needs a real fetch
    assert_eq!(
        view.set_filter("major", "Physics").await,
        Ok(LoadOutcome::Fetched)
    );
    assert_eq!(view.source().calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_results_in_single_fetch() {
    let view = controller(23);

    view.set_search("a");
    advance(Duration::from_millis(100)).await;
    view.set_search("ab");
    advance(Duration::from_millis(100)).await;
    view.set_search("abc");

    assert_eq!(view.settle_search().await, Some(Ok(LoadOutcome::Fetched)));

    let calls = view.source().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].search(), Some("abc"));
    assert_eq!(view.filters().search(), "abc");
}

#[tokio::test(start_paused = true)]
async fn test_clearing_search_fetches_without_term() {
    let view = controller(23);
    view.apply_search("ann").await.unwrap();
    view.go_to_page(2).await.unwrap();

    view.set_search("");
    assert_eq!(view.settle_search().await, Some(Ok(LoadOutcome::Fetched)));

    let last = view.source().calls().pop().unwrap();
    assert_eq!(last.search(), None);
    assert_eq!(last.page(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_filters() {
    let view = controller(23);
    view.apply_selection(&[("major".to_string(), "CS".to_string())], "ann")
        .await
        .unwrap();
    view.go_to_page(2).await.unwrap();

    assert_eq!(view.reset_filters().await, Ok(LoadOutcome::Fetched));
    assert_eq!(view.pagination().page, 1);
    assert_eq!(view.filters().search(), "");
    assert_eq!(view.signature().active_filters().count(), 0);

    assert_eq!(view.reset_filters().await, Ok(LoadOutcome::Unchanged));
}

#[tokio::test(start_paused = true)]
async fn test_selection_is_fetched_once() {
    let view = controller(23);
    let filters = vec![
        ("major".to_string(), "CS".to_string()),
        ("city".to_string(), "Berlin".to_string()),
    ];

    assert_eq!(
        view.apply_selection(&filters, "ann").await,
        Ok(LoadOutcome::Fetched)
    );
    assert_eq!(view.source().calls().len(), 1);

    let bad = vec![
        ("major".to_string(), "Math".to_string()),
        ("salary".to_string(), "high".to_string()),
    ];
    assert!(view.apply_selection(&bad, "").await.is_err());
    // rejected as a whole
    assert!(view.results()[0].contains("major=CS"));
    assert_eq!(view.filters().search(), "ann");
}

#[tokio::test(start_paused = true)]
async fn test_failed_reload_keeps_results() {
    let view = controller(23);
    view.load().await.unwrap();
    let shown = view.results();

    view.source()
        .fail_next(ApiError::Transport("connection reset".to_string()));
    let err = view.reload().await.unwrap_err();
    assert!(err.is_retryable());

    let snapshot = view.snapshot();
    assert_eq!(snapshot.results, shown);
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.unwrap().kind, ViewErrorKind::Transport);

    // a later success clears the error
    assert_eq!(view.reload().await, Ok(LoadOutcome::Fetched));
    assert!(view.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_is_not_cached() {
    let view = controller(23);
    view.source().fail_next(ApiError::Status {
        status: 422,
        message: "bad filter".to_string(),
    });

    assert!(view.load().await.is_err());
    assert_eq!(view.error().unwrap().kind, ViewErrorKind::Rejected);
    assert_eq!(view.cached_pages(), 0);

    assert_eq!(view.load().await, Ok(LoadOutcome::Fetched));
    assert_eq!(view.source().calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_expired_session_asks_for_login() {
    let view = controller(23);
    view.source().fail_next(ApiError::SessionExpired);

    assert_eq!(view.load().await, Err(ApiError::SessionExpired));
    let error = view.error().unwrap();
    assert!(error.requires_login());
    assert!(!view.loading());
}

#[tokio::test(start_paused = true)]
async fn test_reset_drops_search_still_settling() {
    let view = controller(23);
    view.set_filter("major", "CS").await.unwrap();

    view.set_search("abc");
    advance(Duration::from_millis(100)).await;
    assert_eq!(view.reset_filters().await, Ok(LoadOutcome::Fetched));

    // the typed text must not come back once the quiet period is over
    let settled = tokio::time::timeout(Duration::from_secs(2), view.settle_search()).await;
    assert!(settled.is_err());
    assert_eq!(view.filters().search(), "");
    assert_eq!(view.signature().active_filters().count(), 0);
    assert_eq!(view.source().calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reset_drops_search_already_settled() {
    let view = controller(23);
    view.load().await.unwrap();

    view.set_search("abc");
    // settled but not applied yet
    settle_tasks().await;
    advance(Duration::from_millis(600)).await;
    settle_tasks().await;

    assert_eq!(view.reset_filters().await, Ok(LoadOutcome::Unchanged));
    let settled = tokio::time::timeout(Duration::from_secs(2), view.settle_search()).await;
    assert!(settled.is_err());
    assert_eq!(view.filters().search(), "");
    assert_eq!(view.source().calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_selection_drops_search_still_settling() {
    let view = controller(23);

    view.set_search("typed");
    advance(Duration::from_millis(100)).await;
    let filters = vec![("major".to_string(), "CS".to_string())];
    assert_eq!(
        view.apply_selection(&filters, "chosen").await,
        Ok(LoadOutcome::Fetched)
    );

    let settled = tokio::time::timeout(Duration::from_secs(2), view.settle_search()).await;
    assert!(settled.is_err());
    assert_eq!(view.filters().search(), "chosen");

    // typing afterwards still works
    view.set_search("next");
    assert_eq!(view.settle_search().await, Some(Ok(LoadOutcome::Fetched)));
    assert_eq!(view.filters().search(), "next");
}

#[tokio::test(start_paused = true)]
async fn test_clamped_limit_keeps_requested_query() {
    let view = controller(23);
    view.source().clamp_limit(5);

    assert_eq!(view.load().await, Ok(LoadOutcome::Fetched));
    let pagination = view.pagination();
    assert_eq!(pagination.page, 1);
    assert_eq!(pagination.limit, 9);
    assert_eq!(pagination.total_pages, 5);
    assert_eq!(view.results().len(), 5);

    // the page is still found under the query that fetched it
    assert_eq!(view.load().await, Ok(LoadOutcome::Cached));
    assert_eq!(view.next_page().await, Ok(LoadOutcome::Fetched));
    assert_eq!(view.prev_page().await, Ok(LoadOutcome::Cached));
    assert_eq!(view.source().calls().len(), 2);
}
