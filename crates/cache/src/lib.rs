//! Batch cache for paginated tables.
//!
//! Rows arrive in batches of `pages_per_batch` pages. Each batch is split into
//! pages once, on arrival, and stored under its batch number. The cache does no
//! I/O: callers ask for a [`FetchTicket`] before issuing a request and hand the
//! response back through [`BatchCache::complete_fetch`].
//!
//! Every ticket carries the cache generation it was issued in. Invalidation
//! (a new query or filter) bumps the generation, so responses to requests made
//! under the old selection are discarded instead of overwriting fresh data.

use std::collections::{BTreeMap, HashSet};

use pagewatch_core::{PaginatedResponse, PaginationConfig};

/// Permission to fetch one batch, tied to the generation it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    batch: usize,
    generation: u64,
}

impl FetchTicket {
    #[must_use]
    pub const fn batch(&self) -> usize {
        self.batch
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a completed fetch did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// First copy of this batch.
    Inserted,
    /// A cached batch was overwritten; `changed` is false when rows and page count are identical.
    Replaced { changed: bool },
    /// The ticket predates the last invalidation; nothing was stored.
    Discarded,
}

impl BatchOutcome {
    #[must_use]
    pub const fn changed(self) -> bool {
        match self {
            Self::Inserted => true,
            Self::Replaced { changed } => changed,
            Self::Discarded => false,
        }
    }
}

#[derive(Debug)]
pub struct BatchCache<T> {
    config: PaginationConfig,
    batches: BTreeMap<usize, Vec<Vec<T>>>,
    in_flight: HashSet<usize>,
    total_pages: usize,
    total_known: bool,
    generation: u64,
}

impl<T: Clone + PartialEq> BatchCache<T> {
    #[must_use]
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            config,
            batches: BTreeMap::new(),
            in_flight: HashSet::new(),
            total_pages: 1,
            total_known: false,
            generation: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PaginationConfig {
        &self.config
    }

    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Whether a response has reported the row count since the last invalidation.
    #[must_use]
    pub const fn total_known(&self) -> bool {
        self.total_known
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn last_batch(&self) -> usize {
        self.config.last_batch(self.total_pages)
    }

    /// Clamps a 1-based page number into `[1, total_pages]`.
    ///
    /// Before the row count is known only the lower bound applies.
    #[must_use]
    pub fn clamp_page(&self, page: usize) -> usize {
        if self.total_known { page.clamp(1, self.total_pages) } else { page.max(1) }
    }

    /// Rows of a 1-based page, if its batch is cached.
    #[must_use]
    pub fn page(&self, page: usize) -> Option<&[T]> {
        let batch = self.config.batch_for_page(page);
        let index = self.config.index_in_batch(page);
        self.batches.get(&batch).and_then(|pages| pages.get(index)).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains_batch(&self, batch: usize) -> bool {
        self.batches.contains_key(&batch)
    }

    #[must_use]
    pub fn is_in_flight(&self, batch: usize) -> bool {
        self.in_flight.contains(&batch)
    }

    /// Cached batch numbers in ascending order.
    #[must_use]
    pub fn cached_batches(&self) -> Vec<usize> {
        self.batches.keys().copied().collect()
    }

    /// Marks `batch` as in flight. Returns `None` if a request for it is already outstanding.
    pub fn begin_fetch(&mut self, batch: usize) -> Option<FetchTicket> {
        if !self.in_flight.insert(batch) {
            tracing::debug!(batch, "batch already in flight, skipping duplicate fetch");
            return None;
        }
        Some(FetchTicket { batch, generation: self.generation })
    }

    /// Stores the response for `ticket`, unless the cache was invalidated since it was issued.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        response: PaginatedResponse<T>,
    ) -> BatchOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                batch = ticket.batch,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "discarding response for stale generation"
            );
            return BatchOutcome::Discarded;
        }
        self.in_flight.remove(&ticket.batch);

        let total_pages = self.config.total_pages(response.total_items);
        let total_changed = total_pages != self.total_pages;
        self.total_pages = total_pages;
        self.total_known = true;

        let pages = split_into_pages(
            response.items,
            self.config.items_per_page,
            self.config.pages_per_batch,
        );
        match self.batches.insert(ticket.batch, pages) {
            None => BatchOutcome::Inserted,
            Some(previous) => {
                let rows_changed = self.batches.get(&ticket.batch) != Some(&previous);
                BatchOutcome::Replaced { changed: rows_changed || total_changed }
            },
        }
    }

    /// Releases the in-flight mark of a failed request.
    pub fn fail_fetch(&mut self, ticket: FetchTicket) {
        if ticket.generation == self.generation {
            self.in_flight.remove(&ticket.batch);
        }
    }

    /// Drops everything and starts a new generation.
    pub fn invalidate(&mut self) {
        self.batches.clear();
        self.in_flight.clear();
        self.total_pages = 1;
        self.total_known = false;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drops every cached batch except `batch`.
    pub fn retain_except(&mut self, batch: usize) {
        self.batches.retain(|b, _| *b == batch);
    }

    /// Drops batches farther than `radius` from `center`. Returns how many were evicted.
    pub fn evict_outside(&mut self, center: usize, radius: usize) -> usize {
        let before = self.batches.len();
        self.batches.retain(|b, _| b.abs_diff(center) <= radius);
        let evicted = before - self.batches.len();
        if evicted > 0 {
            tracing::debug!(center, radius, evicted, "evicted batches outside window");
        }
        evicted
    }

    /// Batches that should be requested while `current` is visible.
    ///
    /// Order: the current batch, the next one, the previous one, then the
    /// first batch. Cached and in-flight batches are left out.
    #[must_use]
    pub fn batches_to_prefetch(&self, current: usize) -> Vec<usize> {
        let candidates = [
            current,
            current.saturating_add(1).min(self.last_batch()),
            current.saturating_sub(1),
            0,
        ];
        let mut wanted = Vec::with_capacity(candidates.len());
        for batch in candidates {
            if wanted.contains(&batch) || self.contains_batch(batch) || self.is_in_flight(batch) {
                continue;
            }
            wanted.push(batch);
        }
        wanted
    }
}

/// Splits one batch of rows into exactly `pages_per_batch` pages.
///
/// Trailing pages may be short or empty; rows past the batch size are dropped.
#[must_use]
pub fn split_into_pages<T>(
    items: Vec<T>,
    items_per_page: usize,
    pages_per_batch: usize,
) -> Vec<Vec<T>> {
    let capacity = items_per_page.saturating_mul(pages_per_batch);
    if items.len() > capacity {
        tracing::debug!(
            received = items.len(),
            capacity,
            "batch larger than requested, truncating"
        );
    }
    let mut rows = items.into_iter().take(capacity);
    (0..pages_per_batch).map(|_| rows.by_ref().take(items_per_page).collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig::new(2, 3).with_refresh_interval(None)
    }

    fn response(range: std::ops::Range<u32>, total_items: u64) -> PaginatedResponse<u32> {
        PaginatedResponse { items: range.collect(), total_items }
    }

    #[test]
    fn test_split_into_pages() {
        let pages = split_into_pages((0..5).collect::<Vec<u32>>(), 2, 3);
        assert_eq!(pages, vec![vec![0, 1], vec![2, 3], vec![4]]);

        let pages = split_into_pages(vec![1_u32], 2, 3);
        assert_eq!(pages, vec![vec![1], vec![], vec![]]);

        let pages = split_into_pages((0..10).collect::<Vec<u32>>(), 2, 2);
        assert_eq!(pages, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_complete_fetch_stores_pages() {
        let mut cache = BatchCache::new(config());
        let ticket = cache.begin_fetch(1).unwrap();
        assert!(cache.is_in_flight(1));

        let outcome = cache.complete_fetch(ticket, response(6..12, 13));
        assert_eq!(outcome, BatchOutcome::Inserted);
        assert!(!cache.is_in_flight(1));
        assert_eq!(cache.total_pages(), 7);
        assert_eq!(cache.page(4), Some(&[6, 7][..]));
        assert_eq!(cache.page(6), Some(&[10, 11][..]));
        assert_eq!(cache.page(1), None);
    }

    #[test]
    fn test_duplicate_fetch_suppressed() {
        let mut cache: BatchCache<u32> = BatchCache::new(config());
        let ticket = cache.begin_fetch(0);
        assert!(ticket.is_some());
        assert!(cache.begin_fetch(0).is_none());
        if let Some(ticket) = ticket {
            cache.fail_fetch(ticket);
        }
        assert!(cache.begin_fetch(0).is_some());
    }

    #[test]
    fn test_replaced_reports_change() {
        let mut cache = BatchCache::new(config());
        let t = cache.begin_fetch(0).unwrap();
        cache.complete_fetch(t, response(0..6, 6));

        let t = cache.begin_fetch(0).unwrap();
        assert_eq!(
            cache.complete_fetch(t, response(0..6, 6)),
            BatchOutcome::Replaced { changed: false }
        );

        let t = cache.begin_fetch(0).unwrap();
        assert_eq!(
            cache.complete_fetch(t, response(1..7, 6)),
            BatchOutcome::Replaced { changed: true }
        );

        let t = cache.begin_fetch(0).unwrap();
        assert_eq!(
            cache.complete_fetch(t, response(1..7, 20)),
            BatchOutcome::Replaced { changed: true }
        );
        assert_eq!(cache.total_pages(), 10);
    }

    #[test]
    fn test_stale_generation_discarded() {
        let mut cache = BatchCache::new(config());
        let stale = cache.begin_fetch(0).unwrap();
        cache.invalidate();
        let fresh = cache.begin_fetch(0).unwrap();

        assert_eq!(cache.complete_fetch(stale, response(100..106, 50)), BatchOutcome::Discarded);
        assert!(!cache.contains_batch(0));
        assert!(cache.is_in_flight(0), "stale response must not clear the fresh request");
        assert_eq!(cache.total_pages(), 1);

        cache.fail_fetch(stale);
        assert!(cache.is_in_flight(0));

        assert_eq!(cache.complete_fetch(fresh, response(0..2, 2)), BatchOutcome::Inserted);
        assert_eq!(cache.page(1), Some(&[0, 1][..]));
    }

    #[test]
    fn test_invalidate_resets() {
        let mut cache = BatchCache::new(config());
        let t = cache.begin_fetch(0).unwrap();
        cache.complete_fetch(t, response(0..6, 30));
        let _pending = cache.begin_fetch(1);
        let generation = cache.generation();

        cache.invalidate();
        assert!(cache.cached_batches().is_empty());
        assert!(!cache.is_in_flight(1));
        assert_eq!(cache.total_pages(), 1);
        assert_eq!(cache.generation(), generation + 1);
    }

    #[test]
    fn test_empty_total_keeps_one_page() {
        let mut cache = BatchCache::new(config());
        let t = cache.begin_fetch(0).unwrap();
        cache.complete_fetch(t, response(0..0, 0));
        assert_eq!(cache.total_pages(), 1);
        assert_eq!(cache.page(1), Some(&[][..]));
    }

    #[test]
    fn test_batches_to_prefetch() {
        let mut cache = BatchCache::new(config());
        assert_eq!(cache.batches_to_prefetch(0), vec![0]);

        // 30 items / 2 per page = 15 pages = batches 0..=4
        let t = cache.begin_fetch(2).unwrap();
        cache.complete_fetch(t, response(12..18, 30));
        assert_eq!(cache.batches_to_prefetch(2), vec![3, 1, 0]);

        let _in_flight = cache.begin_fetch(3);
        assert_eq!(cache.batches_to_prefetch(2), vec![1, 0]);

        assert_eq!(cache.batches_to_prefetch(4), vec![4, 0]);
    }

    #[test]
    fn test_prefetch_never_past_last_batch() {
        let mut cache = BatchCache::new(config());
        let t = cache.begin_fetch(0).unwrap();
        cache.complete_fetch(t, response(0..4, 4));
        assert_eq!(cache.last_batch(), 0);
        assert!(cache.batches_to_prefetch(0).is_empty());
    }

    #[test]
    fn test_evict_outside_window() {
        let mut cache = BatchCache::new(config());
        for batch in 0..6 {
            let t = cache.begin_fetch(batch).unwrap();
            cache.complete_fetch(t, response(0..6, 60));
        }
        assert_eq!(cache.evict_outside(3, 1), 3);
        assert_eq!(cache.cached_batches(), vec![2, 3, 4]);
        assert_eq!(cache.evict_outside(3, 0), 2);
        assert_eq!(cache.cached_batches(), vec![3]);
    }

    #[test]
    fn test_retain_except() {
        let mut cache = BatchCache::new(config());
        for batch in 0..3 {
            let t = cache.begin_fetch(batch).unwrap();
            cache.complete_fetch(t, response(0..6, 18));
        }
        cache.retain_except(1);
        assert_eq!(cache.cached_batches(), vec![1]);
    }

    #[test]
    fn test_clamp_page() {
        let mut cache = BatchCache::new(config());
        assert_eq!(cache.clamp_page(0), 1);
        assert_eq!(cache.clamp_page(9), 9);
        let t = cache.begin_fetch(0).unwrap();
        cache.complete_fetch(t, response(0..6, 9));
        assert!(cache.total_known());
        assert_eq!(cache.clamp_page(9), 5);
        cache.invalidate();
        assert!(!cache.total_known());
    }
}
