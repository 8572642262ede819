//! Fetch client for paginated admin endpoints.
//!
//! [`FetchClient`] issues the HTTP requests; [`PageSource`] is the seam the
//! batch cache and paginator consume, so they can be driven by anything that
//! answers a [`pagewatch_core::BatchRequest`].

mod client;
pub mod error;
mod source;


pub use client::{DEFAULT_RETRY_DELAYS_SECS, FetchClient, REQUEST_TIMEOUT_SECS, truncate};
pub use error::FetchError;
pub use source::{EndpointSource, PageSource};
