//! Environment variable parsing with warn-level logging for invalid values.

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_ITEMS_PER_PAGE, DEFAULT_MAX_RETRIES, DEFAULT_PAGES_PER_BATCH,
    DEFAULT_REFRESH_INTERVAL_MS,
};

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    parse_with_default(var, std::env::var(var).ok(), default)
}

fn parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    raw: Option<String>,
    default: T,
) -> T {
    match raw {
        Some(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        None => default,
    }
}

/// Settings read from `PAGEWATCH_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub items_per_page: usize,
    pub pages_per_batch: usize,
    /// Zero disables polling.
    pub refresh_ms: u64,
    pub max_retries: usize,
}

impl EnvSettings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("PAGEWATCH_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let api_key = lookup("PAGEWATCH_API_KEY").filter(|v| !v.is_empty());
        Self {
            base_url,
            api_key,
            items_per_page: parse_with_default(
                "PAGEWATCH_ITEMS_PER_PAGE",
                lookup("PAGEWATCH_ITEMS_PER_PAGE"),
                DEFAULT_ITEMS_PER_PAGE,
            ),
            pages_per_batch: parse_with_default(
                "PAGEWATCH_PAGES_PER_BATCH",
                lookup("PAGEWATCH_PAGES_PER_BATCH"),
                DEFAULT_PAGES_PER_BATCH,
            ),
            refresh_ms: parse_with_default(
                "PAGEWATCH_REFRESH_MS",
                lookup("PAGEWATCH_REFRESH_MS"),
                DEFAULT_REFRESH_INTERVAL_MS,
            ),
            max_retries: parse_with_default(
                "PAGEWATCH_MAX_RETRIES",
                lookup("PAGEWATCH_MAX_RETRIES"),
                DEFAULT_MAX_RETRIES,
            ),
        }
    }
}
