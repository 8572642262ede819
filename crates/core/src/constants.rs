//! Shared constants for pagewatch.

/// Rows shown per page when the caller does not configure it.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 8;

/// Pages fetched together in one request when the caller does not configure it.
pub const DEFAULT_PAGES_PER_BATCH: usize = 8;

/// Default polling interval for the visible batch.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5000;

/// Maximum number of rows a single batch request may ask for (DoS protection).
pub const MAX_BATCH_SIZE: usize = 1000;

/// Query parameter carrying the 0-based batch index.
pub const PAGE_NUM_PARAM: &str = "page_num";

/// Query parameter carrying the number of rows per batch.
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Query parameter carrying the free-text search query.
pub const QUERY_PARAM: &str = "q";

/// Backend used when `PAGEWATCH_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Retries for transient fetch failures.
pub const DEFAULT_MAX_RETRIES: usize = 3;
