//! Pagination math and the wire types of batch requests.
//!
//! Pages are 1-based; batches are 0-based. One batch request fetches
//! `pages_per_batch` consecutive pages at once.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ITEMS_PER_PAGE, DEFAULT_PAGES_PER_BATCH, DEFAULT_REFRESH_INTERVAL_MS, MAX_BATCH_SIZE,
    PAGE_NUM_PARAM, PAGE_SIZE_PARAM, QUERY_PARAM,
};
use crate::error::{CoreError, Result};
use crate::filter::Filter;

/// How a paginated table splits and refreshes its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub items_per_page: usize,
    pub pages_per_batch: usize,
    /// `None` disables polling.
    pub refresh_interval: Option<Duration>,
    /// Keep at most this many batches on each side of the visible one.
    pub cache_window: Option<usize>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            pages_per_batch: DEFAULT_PAGES_PER_BATCH,
            refresh_interval: Some(Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS)),
            cache_window: None,
        }
    }
}

impl PaginationConfig {
    #[must_use]
    pub fn new(items_per_page: usize, pages_per_batch: usize) -> Self {
        Self { items_per_page, pages_per_batch, ..Self::default() }
    }

    #[must_use]
    pub const fn with_refresh_interval(mut self, interval: Option<Duration>) -> Self {
        self.refresh_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_cache_window(mut self, radius: Option<usize>) -> Self {
        self.cache_window = radius;
        self
    }

    /// Checks the invariants every other method relies on.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfig` when a size is zero, the batch is
    /// larger than `MAX_BATCH_SIZE`, or the refresh interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.items_per_page == 0 {
            return Err(CoreError::InvalidConfig("items_per_page must be positive".to_owned()));
        }
        if self.pages_per_batch == 0 {
            return Err(CoreError::InvalidConfig("pages_per_batch must be positive".to_owned()));
        }
        let batch_size = self.items_per_page.checked_mul(self.pages_per_batch);
        if batch_size.is_none_or(|size| size > MAX_BATCH_SIZE) {
            return Err(CoreError::InvalidConfig(format!(
                "batch size exceeds maximum of {MAX_BATCH_SIZE} items"
            )));
        }
        if self.refresh_interval.is_some_and(|d| d.is_zero()) {
            return Err(CoreError::InvalidConfig("refresh interval must be non-zero".to_owned()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.items_per_page * self.pages_per_batch
    }

    /// Batch holding the given 1-based page. Page 0 is treated as page 1.
    #[must_use]
    pub const fn batch_for_page(&self, page: usize) -> usize {
        page.saturating_sub(1) / self.pages_per_batch
    }

    /// Position of the given 1-based page inside its batch.
    #[must_use]
    pub const fn index_in_batch(&self, page: usize) -> usize {
        page.saturating_sub(1) % self.pages_per_batch
    }

    /// Number of pages needed for `total_items`; an empty table still has one page.
    #[must_use]
    pub fn total_pages(&self, total_items: u64) -> usize {
        let per_page = self.items_per_page as u64;
        let pages = total_items.div_ceil(per_page).max(1);
        usize::try_from(pages).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub const fn last_batch(&self, total_pages: usize) -> usize {
        total_pages.saturating_sub(1) / self.pages_per_batch
    }
}

/// One request for a batch of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub batch_num: usize,
    pub batch_size: usize,
    pub query: Option<String>,
    pub filter: Filter,
}

impl BatchRequest {
    #[must_use]
    pub fn new(batch_num: usize, batch_size: usize) -> Self {
        Self { batch_num, batch_size, query: None, filter: Filter::default() }
    }

    #[must_use]
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Encodes the request as URL query pairs.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            (PAGE_NUM_PARAM.to_owned(), self.batch_num.to_string()),
            (PAGE_SIZE_PARAM.to_owned(), self.batch_size.to_string()),
        ];
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push((QUERY_PARAM.to_owned(), q.to_owned()));
        }
        pairs.extend(self.filter.query_pairs());
        pairs
    }
}

/// Response body of every paginated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_items: u64,
}

/// Snapshot of the visible page, as published to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView<T> {
    pub current_page: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl<T> PageView<T> {
    /// View shown before the first response arrives.
    #[must_use]
    pub const fn loading(current_page: usize) -> Self {
        Self {
            current_page,
            total_pages: 1,
            items: Vec::new(),
            is_loading: true,
            error: None,
            refreshed_at: None,
        }
    }

    /// Compares everything except the refresh timestamp.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        self.current_page == other.current_page
            && self.total_pages == other.total_pages
            && self.items == other.items
            && self.is_loading == other.is_loading
            && self.error == other.error
    }
}
