//! Fixture backend for pagewatch.
//!
//! Serves the paginated admin endpoints live tables poll (index attempts,
//! indexing errors, query history) from rows loaded out of a JSON fixture.
//! Every list endpoint takes `page_num`/`page_size` and answers
//! `{"items": [...], "total_items": n}`.

pub mod api_error;
mod fixture;
mod handlers;
mod query_types;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub use fixture::FixtureData;

/// Shared state of all handlers, wrapped in `Arc`.
#[derive(Debug, Default)]
pub struct AppState {
    pub data: RwLock<FixtureData>,
}

impl AppState {
    pub fn new(data: FixtureData) -> Self {
        Self { data: RwLock::new(data) }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/manage/admin/cc-pair/{id}/index-attempts",
            get(handlers::cc_pair::list_index_attempts)
                .post(handlers::cc_pair::create_index_attempt),
        )
        .route("/api/manage/admin/cc-pair/{id}/errors", get(handlers::cc_pair::list_errors))
        .route(
            "/api/admin/chat-session-history",
            get(handlers::query_history::list_chat_sessions),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
