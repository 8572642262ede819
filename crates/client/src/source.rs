use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use pagewatch_core::{BatchRequest, PaginatedResponse};
use serde::de::DeserializeOwned;

use crate::client::FetchClient;
use crate::error::FetchError;

/// Anything that can answer a batch request.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetch one batch of rows plus the total row count.
    async fn fetch(&self, request: &BatchRequest) -> Result<PaginatedResponse<T>, FetchError>;
}

/// A [`FetchClient`] bound to one endpoint path.
pub struct EndpointSource<T> {
    client: Arc<FetchClient>,
    endpoint: String,
    _rows: PhantomData<fn() -> T>,
}

impl<T> EndpointSource<T> {
    #[must_use]
    pub fn new(client: Arc<FetchClient>, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into(), _rows: PhantomData }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<T> std::fmt::Debug for EndpointSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointSource")
            .field("client", &self.client)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl<T> PageSource<T> for EndpointSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, request: &BatchRequest) -> Result<PaginatedResponse<T>, FetchError> {
        self.client.fetch_batch(&self.endpoint, request).await
    }
}
