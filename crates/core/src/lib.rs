//! Core types for pagewatch
//!
//! This crate contains the pagination math, filter encoding, wire types and
//! admin row models shared across all other crates.

mod constants;
mod env_config;
mod error;
mod filter;
mod models;
mod pagination;

pub use constants::*;
pub use env_config::*;
pub use error::*;
pub use filter::*;
pub use models::*;
pub use pagination::*;
