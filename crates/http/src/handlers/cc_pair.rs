//! Index attempts and indexing errors of one CC pair.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use pagewatch_core::{IndexAttempt, IndexAttemptError, IndexingStatus, PaginatedResponse};
use serde::Deserialize;

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::{ListParams, within};

fn unknown_cc_pair(cc_pair_id: i64) -> ApiError {
    ApiError::NotFound(format!("cc pair {cc_pair_id} not found"))
}

/// Newest first; `status` repeatable, `start_time`/`end_time` bound `time_started`.
pub async fn list_index_attempts(
    State(state): State<Arc<AppState>>,
    Path(cc_pair_id): Path<i64>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PaginatedResponse<IndexAttempt>>, ApiError> {
    let params = ListParams::new(pairs);
    let page = params.page()?;
    let statuses: Vec<IndexingStatus> = params.all("status")?;
    let start = params.date("start_time")?;
    let end = params.date("end_time")?;

    let data = state.data.read().await;
    if !data.has_cc_pair(cc_pair_id) {
        return Err(unknown_cc_pair(cc_pair_id));
    }
    let mut rows: Vec<IndexAttempt> = data
        .index_attempts
        .get(&cc_pair_id)
        .into_iter()
        .flatten()
        .filter(|a| statuses.is_empty() || statuses.contains(&a.status))
        .filter(|a| within(a.time_started, start, end))
        .cloned()
        .collect();
    drop(data);

    rows.sort_by(|a, b| b.time_started.cmp(&a.time_started).then(b.id.cmp(&a.id)));
    tracing::debug!(cc_pair_id, matched = rows.len(), ?page, "index attempts");
    Ok(Json(page.paginate(rows)))
}

#[derive(Debug, Deserialize)]
pub struct NewIndexAttempt {
    pub status: IndexingStatus,
    #[serde(default)]
    pub new_docs_indexed: u64,
    #[serde(default)]
    pub total_docs_indexed: u64,
    pub error_msg: Option<String>,
}

/// Appends an attempt started now, so pollers see the table move.
/// The CC pair must already exist in the fixture.
pub async fn create_index_attempt(
    State(state): State<Arc<AppState>>,
    Path(cc_pair_id): Path<i64>,
    Json(req): Json<NewIndexAttempt>,
) -> Result<(StatusCode, Json<IndexAttempt>), ApiError> {
    let now = Utc::now();
    let mut data = state.data.write().await;
    if !data.has_cc_pair(cc_pair_id) {
        return Err(unknown_cc_pair(cc_pair_id));
    }
    let attempt = IndexAttempt {
        id: data.next_attempt_id(),
        status: req.status,
        new_docs_indexed: req.new_docs_indexed,
        total_docs_indexed: req.total_docs_indexed,
        docs_removed_from_index: 0,
        error_msg: req.error_msg,
        full_exception_trace: None,
        time_started: Some(now),
        time_updated: now,
    };
    data.index_attempts.entry(cc_pair_id).or_default().push(attempt.clone());
    drop(data);

    tracing::info!(cc_pair_id, id = attempt.id, status = %attempt.status, "index attempt added");
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Newest first; resolved errors only with `include_resolved=true`.
pub async fn list_errors(
    State(state): State<Arc<AppState>>,
    Path(cc_pair_id): Path<i64>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PaginatedResponse<IndexAttemptError>>, ApiError> {
    let params = ListParams::new(pairs);
    let page = params.page()?;
    let include_resolved = params.flag("include_resolved")?.unwrap_or(false);

    let data = state.data.read().await;
    if !data.has_cc_pair(cc_pair_id) {
        return Err(unknown_cc_pair(cc_pair_id));
    }
    let mut rows: Vec<IndexAttemptError> = data
        .index_attempt_errors
        .get(&cc_pair_id)
        .into_iter()
        .flatten()
        .filter(|e| include_resolved || !e.is_resolved)
        .cloned()
        .collect();
    drop(data);

    rows.sort_by(|a, b| b.time_created.cmp(&a.time_created).then(b.id.cmp(&a.id)));
    Ok(Json(page.paginate(rows)))
}
