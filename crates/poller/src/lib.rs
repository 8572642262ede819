//! Polling driver for paginated tables.
//!
//! A [`Paginator`] owns the user's selection (page, query, filter) and a
//! [`pagewatch_cache::BatchCache`]. Navigation loads missing batches and
//! prefetches their neighbours; [`Paginator::start`] re-fetches the visible
//! batch on a fixed interval and publishes a new [`pagewatch_core::PageView`]
//! over a watch channel whenever something visible changed.

pub mod error;
mod paginator;


pub use error::PollerError;
pub use paginator::{PollHandle, PollOutcome, Paginator};
