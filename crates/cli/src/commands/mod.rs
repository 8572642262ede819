pub(crate) mod fetch;
pub(crate) mod serve;
pub(crate) mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pagewatch_client::{EndpointSource, FetchClient, PageSource};
use pagewatch_core::{EnvSettings, Filter, PageView, PaginationConfig};
use pagewatch_poller::Paginator;
use serde_json::Value;

/// What the user asked to look at.
pub(crate) struct PageTarget {
    pub endpoint: String,
    pub page: usize,
    pub query: Option<String>,
    pub filter: Filter,
}

/// Paginator over raw JSON rows, so any endpoint can be shown.
pub(crate) fn build_paginator(
    settings: &EnvSettings,
    endpoint: &str,
    refresh_interval: Option<Duration>,
) -> Result<Paginator<Value>> {
    let client = FetchClient::new(settings.base_url.clone())?
        .with_api_key(settings.api_key.clone())
        .with_max_retries(settings.max_retries);
    let source: Arc<dyn PageSource<Value>> =
        Arc::new(EndpointSource::new(Arc::new(client), endpoint));
    let config = PaginationConfig::new(settings.items_per_page, settings.pages_per_batch)
        .with_refresh_interval(refresh_interval);
    Ok(Paginator::new(source, config)?)
}

pub(crate) fn print_view(view: &PageView<Value>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(view)?);
    Ok(())
}
