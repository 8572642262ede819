use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use pagewatch_cache::{BatchCache, BatchOutcome};
use pagewatch_client::{FetchError, PageSource};
use pagewatch_core::{BatchRequest, Filter, PageView, PaginationConfig};
use tokio::sync::{Mutex, watch};

use crate::error::PollerError;

/// Rounds of prefetching per navigation. One round loads the visible batch,
/// the next one its neighbours once the row count is known.
const MAX_SETTLE_ROUNDS: usize = 3;

/// Result of one polling tick.
#[derive(Debug)]
pub enum PollOutcome {
    /// The visible page changed and a new view was published.
    Changed,
    /// The batch was re-fetched and nothing visible changed.
    Unchanged,
    /// A request for the visible batch was already outstanding.
    Skipped,
    /// The fetch failed; the error is also recorded in the view.
    Failed(PollerError),
}

enum FetchStep {
    Skipped,
    Done(BatchOutcome),
    Failed(FetchError),
}

struct Selection<T> {
    cache: BatchCache<T>,
    current_page: usize,
    query: Option<String>,
    filter: Filter,
    error: Option<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl<T: Clone + PartialEq> Selection<T> {
    fn current_batch(&self) -> usize {
        self.cache.config().batch_for_page(self.current_page)
    }

    fn request_for(&self, batch: usize) -> BatchRequest {
        BatchRequest::new(batch, self.cache.config().batch_size())
            .with_query(self.query.clone())
            .with_filter(self.filter.clone())
    }

    /// Pulls the current page back inside the known page range.
    fn reconcile_page(&mut self) {
        let clamped = self.cache.clamp_page(self.current_page);
        if clamped != self.current_page {
            tracing::debug!(from = self.current_page, to = clamped, "current page out of range");
            self.current_page = clamped;
        }
    }

    fn view(&self) -> PageView<T> {
        let batch = self.current_batch();
        match self.cache.page(self.current_page) {
            Some(items) => PageView {
                current_page: self.current_page,
                total_pages: self.cache.total_pages(),
                items: items.to_vec(),
                is_loading: false,
                error: self.error.clone(),
                refreshed_at: self.refreshed_at,
            },
            None => PageView {
                current_page: self.current_page,
                total_pages: self.cache.total_pages(),
                items: Vec::new(),
                is_loading: self.cache.is_in_flight(batch) || self.error.is_none(),
                error: self.error.clone(),
                refreshed_at: self.refreshed_at,
            },
        }
    }
}

struct Inner<T> {
    source: Arc<dyn PageSource<T>>,
    config: PaginationConfig,
    selection: Mutex<Selection<T>>,
    view_tx: watch::Sender<PageView<T>>,
}

/// Keeps one page of a paginated endpoint fresh.
///
/// Cloning is cheap; clones share the same cache and selection.
pub struct Paginator<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Paginator<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> std::fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator").field("config", &self.inner.config).finish_non_exhaustive()
    }
}

impl<T> Paginator<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a paginator positioned on page 1 with no query or filter.
    ///
    /// # Errors
    /// Returns `PollerError::Config` if the pagination config is invalid.
    pub fn new(
        source: Arc<dyn PageSource<T>>,
        config: PaginationConfig,
    ) -> Result<Self, PollerError> {
        config.validate()?;
        let selection = Selection {
            cache: BatchCache::new(config),
            current_page: 1,
            query: None,
            filter: Filter::default(),
            error: None,
            refreshed_at: None,
        };
        let (view_tx, _initial_rx) = watch::channel(PageView::loading(1));
        Ok(Self {
            inner: Arc::new(Inner { source, config, selection: Mutex::new(selection), view_tx }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PaginationConfig {
        &self.inner.config
    }

    /// Receives every published view. The current one is marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PageView<T>> {
        let mut rx = self.inner.view_tx.subscribe();
        rx.mark_unchanged();
        rx
    }

    /// Last published view.
    #[must_use]
    pub fn view(&self) -> PageView<T> {
        self.inner.view_tx.borrow().clone()
    }

    /// Publishes the current view if it differs from the last one. Returns whether it did.
    async fn publish(&self) -> bool {
        let selection = self.inner.selection.lock().await;
        let next = selection.view();
        // sent under the lock so concurrent publishers cannot reorder views
        self.inner.view_tx.send_if_modified(|current| {
            if current.same_content(&next) {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Fetches one batch unless a request for it is already outstanding.
    async fn fetch_batch(&self, batch: usize) -> FetchStep {
        let (ticket, request) = {
            let mut selection = self.inner.selection.lock().await;
            let Some(ticket) = selection.cache.begin_fetch(batch) else {
                return FetchStep::Skipped;
            };
            (ticket, selection.request_for(batch))
        };

        let result = self.inner.source.fetch(&request).await;

        // Only the visible batch owns the error; prefetches never touch it.
        let mut selection = self.inner.selection.lock().await;
        let visible = batch == selection.current_batch();
        match result {
            Ok(response) => {
                let outcome = selection.cache.complete_fetch(ticket, response);
                if outcome != BatchOutcome::Discarded {
                    if visible {
                        selection.error = None;
                    }
                    selection.refreshed_at = Some(Utc::now());
                    selection.reconcile_page();
                }
                FetchStep::Done(outcome)
            },
            Err(e) => {
                selection.cache.fail_fetch(ticket);
                if visible && ticket.generation() == selection.cache.generation() {
                    selection.error = Some(e.to_string());
                    tracing::warn!(batch, error = %e, "visible batch fetch failed");
                } else {
                    tracing::warn!(batch, error = %e, "prefetch failed");
                }
                FetchStep::Failed(e)
            },
        }
    }

    /// Loads the visible batch and prefetches its neighbours and the first batch.
    async fn settle(&self) {
        if let Some(radius) = self.inner.config.cache_window {
            let mut selection = self.inner.selection.lock().await;
            let current = selection.current_batch();
            selection.cache.evict_outside(current, radius);
        }

        for _ in 0..MAX_SETTLE_ROUNDS {
            let wanted = {
                let selection = self.inner.selection.lock().await;
                selection.cache.batches_to_prefetch(selection.current_batch())
            };
            if wanted.is_empty() {
                break;
            }
            tracing::debug!(?wanted, "fetching batches");

            let steps = join_all(wanted.into_iter().map(|batch| self.fetch_batch(batch))).await;
            self.publish().await;
            if steps.iter().any(|step| matches!(step, FetchStep::Failed(_))) {
                break;
            }
        }
    }

    /// Moves to a 1-based page, loading its batch if needed.
    pub async fn go_to_page(&self, page: usize) -> PageView<T> {
        {
            let mut selection = self.inner.selection.lock().await;
            let previous_batch = selection.current_batch();
            selection.current_page = selection.cache.clamp_page(page);
            if selection.current_batch() != previous_batch {
                selection.error = None;
            }
        }
        self.publish().await;
        self.settle().await;
        self.view()
    }

    /// Replaces the free-text query. A different query restarts from page 1.
    pub async fn set_query(&self, query: Option<String>) -> PageView<T> {
        let query = query.filter(|q| !q.is_empty());
        let changed = {
            let mut selection = self.inner.selection.lock().await;
            if selection.query == query {
                false
            } else {
                selection.query = query;
                true
            }
        };
        self.reselect(changed).await
    }

    /// Replaces the filter. A different filter restarts from page 1.
    pub async fn set_filter(&self, filter: Filter) -> PageView<T> {
        let changed = {
            let mut selection = self.inner.selection.lock().await;
            if selection.filter == filter {
                false
            } else {
                selection.filter = filter;
                true
            }
        };
        self.reselect(changed).await
    }

    async fn reselect(&self, changed: bool) -> PageView<T> {
        if !changed {
            return self.view();
        }
        {
            let mut selection = self.inner.selection.lock().await;
            selection.cache.invalidate();
            selection.current_page = 1;
            selection.error = None;
        }
        tracing::debug!("selection changed, cache invalidated");
        self.publish().await;
        self.settle().await;
        self.view()
    }

    /// Sets query, filter and page in one step.
    ///
    /// Cached batches survive only if query and filter are unchanged.
    pub async fn select(&self, query: Option<String>, filter: Filter, page: usize) -> PageView<T> {
        let query = query.filter(|q| !q.is_empty());
        {
            let mut selection = self.inner.selection.lock().await;
            if selection.query != query || selection.filter != filter {
                selection.query = query;
                selection.filter = filter;
                selection.cache.invalidate();
                selection.error = None;
            }
            selection.current_page = selection.cache.clamp_page(page);
        }
        self.publish().await;
        self.settle().await;
        self.view()
    }

    /// Re-fetches the visible batch now and forgets every other batch.
    pub async fn refresh(&self) -> PageView<T> {
        let batch = {
            let mut selection = self.inner.selection.lock().await;
            let batch = selection.current_batch();
            selection.cache.retain_except(batch);
            batch
        };
        self.fetch_batch(batch).await;
        self.publish().await;
        self.settle().await;
        self.view()
    }

    /// One polling tick: re-fetch the visible batch and publish if anything changed.
    pub async fn poll_once(&self) -> PollOutcome {
        let batch = self.inner.selection.lock().await.current_batch();
        match self.fetch_batch(batch).await {
            FetchStep::Skipped => PollOutcome::Skipped,
            FetchStep::Failed(e) => {
                self.publish().await;
                PollOutcome::Failed(PollerError::Fetch(e))
            },
            FetchStep::Done(_) => {
                let mut changed = self.publish().await;
                let moved = self.inner.selection.lock().await.current_batch() != batch;
                if moved {
                    self.settle().await;
                    changed = true;
                }
                if changed { PollOutcome::Changed } else { PollOutcome::Unchanged }
            },
        }
    }

    /// Loads the visible page, then polls it every `refresh_interval` until the handle is dropped.
    ///
    /// Without a refresh interval only the initial load runs.
    #[must_use]
    pub fn start(&self) -> PollHandle {
        let paginator = self.clone();
        let task = tokio::spawn(async move {
            paginator.settle().await;
            let Some(period) = paginator.inner.config.refresh_interval else {
                tracing::debug!("no refresh interval, polling disabled");
                return;
            };

            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match paginator.poll_once().await {
                    PollOutcome::Changed => tracing::debug!("poll: visible page changed"),
                    PollOutcome::Unchanged => {},
                    PollOutcome::Skipped => tracing::debug!("poll: previous fetch still running"),
                    PollOutcome::Failed(e) if e.is_transient() => {
                        tracing::warn!(error = %e, "poll failed, retrying next tick");
                    },
                    PollOutcome::Failed(e) => tracing::error!(error = %e, "poll failed"),
                }
            }
        });
        PollHandle { task }
    }
}

/// Owns the polling task; dropping it stops polling.
#[derive(Debug)]
pub struct PollHandle {
    task: tokio::task::JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
