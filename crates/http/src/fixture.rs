//! In-memory rows served by the fixture backend.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use pagewatch_core::{ChatSessionSnapshot, IndexAttempt, IndexAttemptError};
use serde::{Deserialize, Serialize};

/// Fixture file contents. Map keys are CC pair ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    pub index_attempts: BTreeMap<i64, Vec<IndexAttempt>>,
    #[serde(default)]
    pub index_attempt_errors: BTreeMap<i64, Vec<IndexAttemptError>>,
    #[serde(default)]
    pub chat_sessions: Vec<ChatSessionSnapshot>,
}

impl FixtureData {
    /// Reads and parses a JSON fixture file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let data: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))?;
        tracing::info!(
            cc_pairs = data.index_attempts.len(),
            chat_sessions = data.chat_sessions.len(),
            "loaded fixture {}",
            path.display()
        );
        Ok(data)
    }

    pub fn has_cc_pair(&self, cc_pair_id: i64) -> bool {
        self.index_attempts.contains_key(&cc_pair_id)
            || self.index_attempt_errors.contains_key(&cc_pair_id)
    }

    /// Next free index attempt id across all CC pairs.
    pub fn next_attempt_id(&self) -> i64 {
        self.index_attempts.values().flatten().map(|a| a.id).max().unwrap_or(0).saturating_add(1)
    }
}
