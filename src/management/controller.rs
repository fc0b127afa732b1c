use std::{
    future::Future,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use tokio::sync::watch;
use tracing::debug;

use crate::{
    config::Settings,
    error::{ApiError, ControlError},
    management::{
        cache::{CacheEntry, QuerySignature, ResultCache},
        debounce::Debouncer,
        filter::FilterState,
        pagination::PaginationState,
    },
    types::ListResponse,
};

/// Where a controller gets its pages from.
pub trait PageSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;

    fn fetch_page(
        &self,
        signature: &QuerySignature,
    ) -> impl Future<Output = Result<ListResponse<Self::Item>, ApiError>> + Send;
}

/// Knobs of a list view.
#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub page_size: u32,
    pub debounce: Duration,
    pub cache_ttl: Option<Duration>,
}

impl From<&Settings> for ListOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            page_size: settings.page_size,
            debounce: settings.debounce,
            cache_ttl: settings.cache_ttl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewErrorKind {
    /// No response; trying again later may help.
    Transport,
    /// The session is gone and the user must log in again.
    Reauthenticate,
    /// The server refused the query.
    Rejected,
    /// Anything else (bad payload, local storage).
    Unexpected,
}

/// Error as shown by a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError {
    pub kind: ViewErrorKind,
    pub message: String,
}

impl ViewError {
    pub fn requires_login(&self) -> bool {
        self.kind == ViewErrorKind::Reauthenticate
    }
}

impl From<&ApiError> for ViewError {
    fn from(err: &ApiError) -> Self {
        let kind = match err {
            ApiError::Transport(_) => ViewErrorKind::Transport,
            ApiError::SessionExpired => ViewErrorKind::Reauthenticate,
            ApiError::Status { .. } => ViewErrorKind::Rejected,
            ApiError::Decode(_) | ApiError::Storage(_) => ViewErrorKind::Unexpected,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Everything the presentation layer may read from a list view.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub results: Vec<T>,
    pub pagination: PaginationState,
    pub loading: bool,
    pub error: Option<ViewError>,
}

/// What a load request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Served from the cache, no request sent.
    Cached,
    /// Fetched from the server and applied.
    Fetched,
    /// A newer query took over; the response was dropped.
    Superseded,
    /// The mutation did not change the query, nothing was loaded.
    Unchanged,
}

struct ViewState<T> {
    filters: FilterState,
    cache: ResultCache<T>,
    pagination: PaginationState,
    results: Vec<T>,
    shown: Option<QuerySignature>,
    loading: bool,
    error: Option<ViewError>,
}

impl<T: Clone> ViewState<T> {
    fn signature(&self) -> QuerySignature {
        QuerySignature::new(&self.filters, self.pagination.page, self.pagination.limit)
    }

    /// Drops everything derived from the previous filter selection.
    fn invalidate(&mut self) {
        self.cache.clear();
        self.pagination.rewind();
        self.results.clear();
        self.shown = None;
        self.error = None;
    }

    fn apply(&mut self, signature: QuerySignature, results: Vec<T>, pagination: PaginationState) {
        self.results = results;
        self.pagination = pagination;
        self.shown = Some(signature);
        self.loading = false;
        self.error = None;
    }
}

/// Drives one list view: filters, debounced search, cache, pagination and
/// the fetches behind them.
///
/// Every change of the query bumps the view's epoch. A fetch is raced against
/// the epoch and dropped as soon as it moves, and a response is only applied
/// if its signature is still the current one. Results are never shown under
/// a signature they were not fetched for.
pub struct ListQueryController<S: PageSource> {
    source: S,
    state: Mutex<ViewState<S::Item>>,
    epoch: watch::Sender<u64>,
    search: Debouncer<String>,
}

impl<S: PageSource> ListQueryController<S> {
    /// Creates the controller. Needs a tokio runtime for the search
    /// debouncer.
    pub fn new(source: S, filter_keys: &'static [&'static str], options: ListOptions) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            source,
            state: Mutex::new(ViewState {
                filters: FilterState::new(filter_keys),
                cache: ResultCache::new(options.cache_ttl),
                pagination: PaginationState::new(options.page_size),
                results: Vec::new(),
                shown: None,
                loading: false,
                error: None,
            }),
            epoch,
            search: Debouncer::new(options.debounce),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> ListView<S::Item> {
        let state = self.lock();
        ListView {
            results: state.results.clone(),
            pagination: state.pagination,
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn results(&self) -> Vec<S::Item> {
        self.lock().results.clone()
    }

    pub fn pagination(&self) -> PaginationState {
        self.lock().pagination
    }

    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<ViewError> {
        self.lock().error.clone()
    }

    pub fn filters(&self) -> FilterState {
        self.lock().filters.clone()
    }

    pub fn signature(&self) -> QuerySignature {
        self.lock().signature()
    }

    pub fn cached_pages(&self) -> usize {
        self.lock().cache.len()
    }

    /// Sets one filter, then loads the first page of the new selection.
    pub async fn set_filter(&self, key: &str, value: &str) -> Result<LoadOutcome, ControlError> {
        let changed = {
            let mut state = self.lock();
            let changed = state.filters.set_filter(key, value)?;
            if changed {
                state.invalidate();
                self.advance_epoch();
            }
            changed
        };

        if !changed {
            return Ok(LoadOutcome::Unchanged);
        }
        Ok(self.load().await?)
    }

    pub async fn clear_filter(&self, key: &str) -> Result<LoadOutcome, ControlError> {
        self.set_filter(key, "").await
    }

    /// Applies several filters and a settled search term as one change, so
    /// only the final selection is fetched. Search input still waiting to
    /// settle is dropped. Nothing changes if any key is unknown.
    pub async fn apply_selection(
        &self,
        filters: &[(String, String)],
        search: &str,
    ) -> Result<LoadOutcome, ControlError> {
        let changed = {
            let mut state = self.lock();
            let mut next = state.filters.clone();
            let mut changed = false;
            for (key, value) in filters {
                changed |= next.set_filter(key, value)?;
            }
            changed |= next.apply_search(search);
            self.search.cancel();
            if changed {
                state.filters = next;
                state.invalidate();
                self.advance_epoch();
            }
            changed
        };

        if !changed {
            return Ok(LoadOutcome::Unchanged);
        }
        Ok(self.load().await?)
    }

    /// Buffers raw search input. Nothing is fetched until the input settles;
    /// see [`settle_search`](Self::settle_search).
    pub fn set_search(&self, text: &str) {
        self.lock().filters.set_search_input(text);
        self.search.push(text.to_string());
    }

    /// Waits for buffered search input to settle and applies it. Returns
    /// `None` once the debouncer has shut down.
    pub async fn settle_search(&self) -> Option<Result<LoadOutcome, ApiError>> {
        let settled = self.next_settled_search().await?;
        Some(self.apply_search(&settled).await)
    }

    /// Waits for the next settled search term without applying it.
    ///
    /// Cancel-safe, so it can sit in a `select!` next to other input.
    pub async fn next_settled_search(&self) -> Option<String> {
        self.search.next_settled().await
    }

    /// Applies a settled search term right away.
    pub async fn apply_search(&self, settled: &str) -> Result<LoadOutcome, ApiError> {
        let changed = {
            let mut state = self.lock();
            let changed = state.filters.apply_search(settled);
            if changed {
                state.invalidate();
                self.advance_epoch();
            }
            changed
        };

        if !changed {
            return Ok(LoadOutcome::Unchanged);
        }
        self.load().await
    }

    /// Clears every filter and the search term, including search input that
    /// has not settled yet.
    pub async fn reset_filters(&self) -> Result<LoadOutcome, ApiError> {
        self.search.cancel();
        let changed = {
            let mut state = self.lock();
            let changed = state.filters.reset();
            if changed {
                state.invalidate();
                self.advance_epoch();
            }
            changed
        };

        if !changed {
            return Ok(LoadOutcome::Unchanged);
        }
        self.load().await
    }

    /// Moves to `page`. Pages outside `1..=total_pages` are ignored.
    pub async fn go_to_page(&self, page: u32) -> Result<LoadOutcome, ApiError> {
        let moved = {
            let mut state = self.lock();
            let moved = state.pagination.go_to(page);
            if moved {
                self.advance_epoch();
            }
            moved
        };

        if !moved {
            return Ok(LoadOutcome::Unchanged);
        }
        self.load().await
    }

    pub async fn next_page(&self) -> Result<LoadOutcome, ApiError> {
        let page = self.pagination().page.saturating_add(1);
        self.go_to_page(page).await
    }

    pub async fn prev_page(&self) -> Result<LoadOutcome, ApiError> {
        let page = self.pagination().page.saturating_sub(1);
        self.go_to_page(page).await
    }

    /// Shows the page for the current query, from the cache if possible.
    pub async fn load(&self) -> Result<LoadOutcome, ApiError> {
        self.fetch(false).await
    }

    /// Fetches the current query from the server even if it is cached. On
    /// failure the results already on screen stay in place.
    pub async fn reload(&self) -> Result<LoadOutcome, ApiError> {
        self.fetch(true).await
    }

    async fn fetch(&self, bypass_cache: bool) -> Result<LoadOutcome, ApiError> {
        let (signature, issued) = {
            let mut state = self.lock();
            let signature = state.signature();

            if !bypass_cache {
                if let Some(entry) = state.cache.get(&signature).cloned() {
                    debug!(%signature, "serving page from cache");
                    state.apply(signature, entry.results, entry.pagination);
                    return Ok(LoadOutcome::Cached);
                }
            }

            if state.shown.as_ref() != Some(&signature) {
                state.results.clear();
                state.shown = None;
            }
            state.loading = true;
            (signature, *self.epoch.borrow())
        };

        debug!(%signature, "fetching page");
        let mut epochs = self.epoch.subscribe();
        let response = tokio::select! {
            response = self.source.fetch_page(&signature) => response,
            _ = superseded(&mut epochs, issued) => {
                debug!(%signature, "query superseded, fetch cancelled");
                return Ok(LoadOutcome::Superseded);
            }
        };

        let mut state = self.lock();
        if *self.epoch.borrow() != issued || state.signature() != signature {
            debug!(%signature, "discarding response for a stale query");
            return Ok(LoadOutcome::Superseded);
        }

        state.loading = false;
        match response {
            Ok(page) => {
                let pagination = PaginationState::for_request(
                    &page.pagination,
                    signature.page(),
                    signature.limit(),
                );
                state.cache.put(
                    signature.clone(),
                    CacheEntry::new(page.data.clone(), pagination),
                );
                state.apply(signature, page.data, pagination);
                Ok(LoadOutcome::Fetched)
            }
            Err(e) => {
                state.error = Some(ViewError::from(&e));
                Err(e)
            }
        }
    }

    fn advance_epoch(&self) {
        self.epoch.send_modify(|epoch| *epoch += 1);
    }

    fn lock(&self) -> MutexGuard<'_, ViewState<S::Item>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resolves once the epoch has moved past `issued`.
async fn superseded(epochs: &mut watch::Receiver<u64>, issued: u64) {
    loop {
        if *epochs.borrow_and_update() != issued {
            return;
        }
        if epochs.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
