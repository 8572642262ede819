use std::time::Duration;

use pagewatch_core::{BatchRequest, DEFAULT_MAX_RETRIES, PaginatedResponse};
use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// Per-request timeout.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Delay before each attempt; attempts past the end reuse the last entry.
pub const DEFAULT_RETRY_DELAYS_SECS: [u64; 4] = [0, 1, 2, 4];

/// Client for paginated REST endpoints.
pub struct FetchClient {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) max_retries: usize,
    pub(crate) retry_delays: Vec<Duration>,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("max_retries", &self.max_retries)
            .field("retry_delays", &self.retry_delays)
            .finish()
    }
}

impl FetchClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delays: DEFAULT_RETRY_DELAYS_SECS.iter().map(|s| Duration::from_secs(*s)).collect(),
        })
    }

    /// Sends `Authorization: Bearer <key>` with every request.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> Result<String, FetchError> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Ok(endpoint.to_owned());
        }
        if !endpoint.starts_with('/') {
            return Err(FetchError::InvalidEndpoint(format!(
                "endpoint must be an absolute path or URL, got '{endpoint}'"
            )));
        }
        Ok(format!("{}{}", self.base_url, endpoint))
    }

    fn delay_before(&self, attempt: usize) -> Duration {
        self.retry_delays
            .get(attempt)
            .or_else(|| self.retry_delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Fetches one batch of rows from `endpoint`.
    ///
    /// # Errors
    /// Returns an error if the endpoint is malformed, the API returns a
    /// non-retryable status, the body cannot be parsed, or every retry of a
    /// transient failure failed.
    pub async fn fetch_batch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &BatchRequest,
    ) -> Result<PaginatedResponse<T>, FetchError> {
        let url = self.url_for(endpoint)?;
        let pairs = request.query_pairs();
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.delay_before(attempt);
                tokio::time::sleep(delay).await;
                tracing::warn!(
                    endpoint,
                    batch = request.batch_num,
                    "fetch retry attempt {attempt}/{} after {delay:?}",
                    self.max_retries
                );
            }

            let mut builder = self.client.get(&url).query(&pairs);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            let response = match builder.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(FetchError::HttpRequest(e));
                    continue;
                },
            };

            let status = response.status();
            if status.is_success() {
                let body = match response.text().await {
                    Ok(b) => b,
                    Err(e) => {
                        last_error = Some(FetchError::HttpRequest(e));
                        continue;
                    },
                };

                let page: PaginatedResponse<T> =
                    serde_json::from_str(&body).map_err(|e| FetchError::JsonParse {
                        context: format!(
                            "paginated response from {endpoint} (body: {})",
                            truncate(&body, 200)
                        ),
                        source: e,
                    })?;

                tracing::debug!(
                    endpoint,
                    batch = request.batch_num,
                    items = page.items.len(),
                    total_items = page.total_items,
                    "fetched batch"
                );
                return Ok(page);
            }

            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            let err = FetchError::HttpStatus { code: status.as_u16(), body };
            if err.is_transient() {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(FetchError::RetriesExhausted(Box::new(
            last_error.unwrap_or(FetchError::ClientInit("no attempt was made".to_owned())),
        )))
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
