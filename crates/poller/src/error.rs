//! Typed error enum for the poller.

use pagewatch_client::FetchError;
use pagewatch_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollerError {
    /// Pagination config failed validation.
    #[error("config: {0}")]
    Config(#[from] CoreError),

    /// Fetching a batch failed.
    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),
}

impl PollerError {
    /// Whether retrying on the next tick may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_transient() || matches!(e, FetchError::RetriesExhausted(_)),
            Self::Config(_) => false,
        }
    }
}
