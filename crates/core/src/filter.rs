//! Filter parameters attached to paginated requests.
//!
//! Filters are kept in a sorted map so two equal filters always encode to the
//! same query string, which is what change detection relies on.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{CoreError, Result};

/// A single filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Number(f64),
    /// Encoded as one query pair per element.
    List(Vec<String>),
    /// Encoded as ISO-8601 UTC with millisecond precision.
    Date(DateTime<Utc>),
}

impl FilterValue {
    /// Infers a typed value from a raw command-line string.
    ///
    /// `true`/`false` become booleans, finite numbers become numbers, RFC 3339
    /// timestamps become dates, anything else stays text.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {},
        }
        if let Ok(n) = raw.parse::<f64>() {
            if n.is_finite() {
                return Self::Number(n);
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self::Date(dt.with_timezone(&Utc));
        }
        Self::Text(raw.to_owned())
    }

    fn encode(&self) -> Vec<String> {
        match self {
            Self::Text(s) => vec![s.clone()],
            Self::Bool(b) => vec![b.to_string()],
            Self::Number(n) => vec![n.to_string()],
            Self::List(items) => items.clone(),
            Self::Date(dt) => vec![dt.to_rfc3339_opts(SecondsFormat::Millis, true)],
        }
    }

    /// Raw string form used when a repeated key turns a scalar into a list.
    fn into_list_items(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Text(s) => vec![s],
            other => other.encode(),
        }
    }
}

/// Ordered set of named filter values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    values: BTreeMap<String, FilterValue>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FilterValue) {
        self.values.insert(key.into(), value);
    }

    /// Adds `value` under `key`; a key seen twice becomes a list.
    pub fn append(&mut self, key: impl Into<String>, value: FilterValue) {
        let key = key.into();
        match self.values.remove(&key) {
            None => {
                self.values.insert(key, value);
            },
            Some(existing) => {
                let mut items = existing.into_list_items();
                items.extend(value.into_list_items());
                self.values.insert(key, FilterValue::List(items));
            },
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses `key=value` assignments, as given on the command line.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidFilter` for an assignment without `=` or with an empty key.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment.split_once('=').ok_or_else(|| {
                CoreError::InvalidFilter(format!("expected key=value, got '{assignment}'"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CoreError::InvalidFilter(format!(
                    "empty filter key in '{assignment}'"
                )));
            }
            filter.append(key, FilterValue::infer(value));
        }
        Ok(filter)
    }

    /// Encodes the filter as query pairs, keys in sorted order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .flat_map(|(key, value)| value.encode().into_iter().map(move |v| (key.clone(), v)))
            .collect()
    }
}
