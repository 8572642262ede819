use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised while building pagination requests or configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid pagination config: {0}")]
    InvalidConfig(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = StdResult<T, CoreError>;
