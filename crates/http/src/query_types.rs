//! Query string parsing for the paginated list endpoints.
//!
//! Filters may repeat a key (`status=failed&status=success`), so handlers take
//! the raw pairs and pull typed values out of them here.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use pagewatch_core::{
    DEFAULT_ITEMS_PER_PAGE, DEFAULT_PAGES_PER_BATCH, MAX_BATCH_SIZE, PAGE_NUM_PARAM,
    PAGE_SIZE_PARAM, PaginatedResponse, QUERY_PARAM,
};

use crate::api_error::ApiError;

/// Which slice of the filtered rows to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page_num: usize,
    pub page_size: usize,
}

impl PageParams {
    /// Returns the requested slice of `rows` along with the full row count.
    pub fn paginate<T>(self, rows: Vec<T>) -> PaginatedResponse<T> {
        let total_items = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(self.page_num.saturating_mul(self.page_size))
            .take(self.page_size)
            .collect();
        PaginatedResponse { items, total_items }
    }
}

/// Raw query pairs of one request.
#[derive(Debug, Default)]
pub struct ListParams {
    pairs: Vec<(String, String)>,
}

impl ListParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn parse_one<T: FromStr>(&self, key: &str) -> Result<Option<T>, ApiError> {
        self.first(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ApiError::BadRequest(format!("invalid value for {key}: {raw}")))
            })
            .transpose()
    }

    /// `page_num` (default 0) and `page_size` (default one batch, capped at `MAX_BATCH_SIZE`).
    pub fn page(&self) -> Result<PageParams, ApiError> {
        let page_num = self.parse_one(PAGE_NUM_PARAM)?.unwrap_or(0);
        let page_size: usize = self
            .parse_one(PAGE_SIZE_PARAM)?
            .unwrap_or(DEFAULT_ITEMS_PER_PAGE * DEFAULT_PAGES_PER_BATCH);
        if page_size == 0 {
            return Err(ApiError::BadRequest(format!("{PAGE_SIZE_PARAM} must be positive")));
        }
        Ok(PageParams { page_num, page_size: page_size.min(MAX_BATCH_SIZE) })
    }

    /// Every value of a repeatable key, parsed.
    pub fn all<T>(&self, key: &str) -> Result<Vec<T>, ApiError>
    where
        T: FromStr<Err = String>,
    {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.parse().map_err(ApiError::BadRequest))
            .collect()
    }

    pub fn date(&self, key: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
        self.first(key)
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).map_err(|e| {
                    ApiError::BadRequest(format!("invalid date for {key}: {raw} ({e})"))
                })
            })
            .transpose()
    }

    pub fn flag(&self, key: &str) -> Result<Option<bool>, ApiError> {
        self.parse_one(key)
    }

    pub fn one<T>(&self, key: &str) -> Result<Option<T>, ApiError>
    where
        T: FromStr<Err = String>,
    {
        self.first(key).map(|raw| raw.parse().map_err(ApiError::BadRequest)).transpose()
    }

    /// Free-text query; blank counts as absent.
    pub fn query(&self) -> Option<String> {
        self.first(QUERY_PARAM).map(str::trim).filter(|q| !q.is_empty()).map(str::to_lowercase)
    }
}

/// Whether `time` falls inside `[start, end]`. Rows without a time only match unbounded ranges.
pub fn within(
    time: Option<DateTime<Utc>>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    time.is_some_and(|t| start.is_none_or(|s| t >= s) && end.is_none_or(|e| t <= e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewatch_core::IndexingStatus;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::new(pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect())
    }

    #[test]
    fn test_page_defaults_and_cap() {
        let page = params(&[]).page().unwrap();
        assert_eq!(page, PageParams { page_num: 0, page_size: 64 });

        let page = params(&[("page_num", "3"), ("page_size", "5000")]).page().unwrap();
        assert_eq!(page, PageParams { page_num: 3, page_size: MAX_BATCH_SIZE });
    }

    #[test]
    fn test_page_rejects_bad_values() {
        assert!(params(&[("page_size", "0")]).page().is_err());
        assert!(params(&[("page_num", "-1")]).page().is_err());
        assert!(params(&[("page_num", "abc")]).page().is_err());
    }

    #[test]
    fn test_repeated_status() {
        let p = params(&[("status", "failed"), ("status", "success")]);
        let statuses: Vec<IndexingStatus> = p.all("status").unwrap();
        assert_eq!(statuses, vec![IndexingStatus::Failed, IndexingStatus::Success]);

        let p = params(&[("status", "exploded")]);
        assert!(p.all::<IndexingStatus>("status").is_err());
    }

    #[test]
    fn test_date_and_flag() {
        let p = params(&[("start_time", "2024-05-01T00:00:00.000Z"), ("include_resolved", "true")]);
        assert!(p.date("start_time").unwrap().is_some());
        assert_eq!(p.date("end_time").unwrap(), None);
        assert_eq!(p.flag("include_resolved").unwrap(), Some(true));
        assert!(params(&[("start_time", "yesterday")]).date("start_time").is_err());
    }

    #[test]
    fn test_query_blank_is_none() {
        assert_eq!(params(&[("q", "  ")]).query(), None);
        assert_eq!(params(&[("q", "Alice")]).query().as_deref(), Some("alice"));
    }

    #[test]
    fn test_paginate_slices() {
        let page = PageParams { page_num: 1, page_size: 3 };
        let response = page.paginate((0..8).collect::<Vec<u32>>());
        assert_eq!(response.items, vec![3, 4, 5]);
        assert_eq!(response.total_items, 8);

        let page = PageParams { page_num: 5, page_size: 3 };
        assert!(page.paginate((0..8).collect::<Vec<u32>>()).items.is_empty());
    }

    #[test]
    fn test_within() {
        let t = |s: &str| Some(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc));
        let mid = t("2024-05-02T00:00:00Z");
        assert!(within(None, None, None));
        assert!(within(mid, t("2024-05-01T00:00:00Z"), t("2024-05-03T00:00:00Z")));
        assert!(!within(mid, t("2024-05-03T00:00:00Z"), None));
        assert!(!within(None, t("2024-05-01T00:00:00Z"), None));
    }
}
