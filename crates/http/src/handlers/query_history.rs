//! Chat session history of the admin query-history table.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use pagewatch_core::{ChatSessionSnapshot, FeedbackType, PaginatedResponse};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::{ListParams, within};

fn matches_query(session: &ChatSessionSnapshot, query: &str) -> bool {
    [session.user_email.as_deref(), session.name.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(query))
}

/// Newest first; filters `feedback_type`, `start_time`, `end_time` and `q`.
pub async fn list_chat_sessions(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PaginatedResponse<ChatSessionSnapshot>>, ApiError> {
    let params = ListParams::new(pairs);
    let page = params.page()?;
    let feedback: Option<FeedbackType> = params.one("feedback_type")?;
    let start = params.date("start_time")?;
    let end = params.date("end_time")?;
    let query = params.query();

    let data = state.data.read().await;
    let mut rows: Vec<ChatSessionSnapshot> = data
        .chat_sessions
        .iter()
        .filter(|s| feedback.is_none_or(|f| s.feedback_type == Some(f)))
        .filter(|s| within(Some(s.time_created), start, end))
        .filter(|s| query.as_deref().is_none_or(|q| matches_query(s, q)))
        .cloned()
        .collect();
    drop(data);

    rows.sort_by(|a, b| b.time_created.cmp(&a.time_created).then_with(|| b.id.cmp(&a.id)));
    Ok(Json(page.paginate(rows)))
}
