use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use pagewatch_http::{AppState, FixtureData, create_router};

pub(crate) async fn run(fixture: &Path, host: &str, port: u16) -> Result<()> {
    let data = FixtureData::load(fixture)?;
    let router = create_router(Arc::new(AppState::new(data)));

    let addr = format!("{host}:{port}");
    tracing::info!("Starting fixture backend on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for Ctrl-C: {e}");
            }
        })
        .await?;
    tracing::info!("fixture backend stopped");
    Ok(())
}
