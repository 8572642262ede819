//! Rows served by the admin endpoints that live tables poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndexingStatus {
    NotStarted,
    InProgress,
    Success,
    Canceled,
    Failed,
    CompletedWithErrors,
}

impl IndexingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
            Self::CompletedWithErrors => "completed_with_errors",
        }
    }
}

impl std::fmt::Display for IndexingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IndexingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "success" => Ok(Self::Success),
            "canceled" => Ok(Self::Canceled),
            "failed" => Ok(Self::Failed),
            "completed_with_errors" => Ok(Self::CompletedWithErrors),
            _ => Err(format!("Invalid indexing status: {s}")),
        }
    }
}

/// One indexing run of a connector-credential pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexAttempt {
    pub id: i64,
    pub status: IndexingStatus,
    #[serde(default)]
    pub new_docs_indexed: u64,
    #[serde(default)]
    pub total_docs_indexed: u64,
    #[serde(default)]
    pub docs_removed_from_index: u64,
    pub error_msg: Option<String>,
    pub full_exception_trace: Option<String>,
    pub time_started: Option<DateTime<Utc>>,
    pub time_updated: DateTime<Utc>,
}

/// A per-document failure recorded during an index attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexAttemptError {
    pub id: i64,
    pub index_attempt_id: i64,
    pub document_id: Option<String>,
    pub document_link: Option<String>,
    pub entity_id: Option<String>,
    pub failed_time_range_start: Option<DateTime<Utc>>,
    pub failed_time_range_end: Option<DateTime<Utc>>,
    pub failure_message: String,
    #[serde(default)]
    pub is_resolved: bool,
    pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Like,
    Dislike,
    Mixed,
}

impl std::str::FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            "mixed" => Ok(Self::Mixed),
            _ => Err(format!("Invalid feedback type: {s}")),
        }
    }
}

/// Row of the query history table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSessionSnapshot {
    pub id: String,
    pub user_email: Option<String>,
    pub name: Option<String>,
    pub first_user_message: Option<String>,
    pub assistant_name: Option<String>,
    pub feedback_type: Option<FeedbackType>,
    #[serde(default)]
    pub message_count: u32,
    pub time_created: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            IndexingStatus::NotStarted,
            IndexingStatus::InProgress,
            IndexingStatus::Success,
            IndexingStatus::Canceled,
            IndexingStatus::Failed,
            IndexingStatus::CompletedWithErrors,
        ] {
            assert_eq!(status.as_str().parse::<IndexingStatus>(), Ok(status));
        }
        assert!("running".parse::<IndexingStatus>().is_err());
    }

    #[test]
    fn test_index_attempt_wire_format() {
        let attempt: IndexAttempt = serde_json::from_value(serde_json::json!({
            "id": 7,
            "status": "completed_with_errors",
            "new_docs_indexed": 12,
            "error_msg": null,
            "full_exception_trace": null,
            "time_started": "2024-05-01T10:00:00Z",
            "time_updated": "2024-05-01T10:05:00Z"
        }))
        .unwrap();
        assert_eq!(attempt.status, IndexingStatus::CompletedWithErrors);
        assert_eq!(attempt.total_docs_indexed, 0);
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["status"], "completed_with_errors");
    }

    #[test]
    fn test_feedback_type_parse() {
        assert_eq!("dislike".parse::<FeedbackType>(), Ok(FeedbackType::Dislike));
        assert!("meh".parse::<FeedbackType>().is_err());
    }
}
