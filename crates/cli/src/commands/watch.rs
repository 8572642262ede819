use std::time::Duration;

use anyhow::Result;
use pagewatch_core::EnvSettings;

use super::{PageTarget, build_paginator, print_view};

pub(crate) async fn run_watch(
    settings: &EnvSettings,
    target: PageTarget,
    max_updates: Option<usize>,
) -> Result<()> {
    let refresh_interval =
        (settings.refresh_ms > 0).then(|| Duration::from_millis(settings.refresh_ms));
    let paginator = build_paginator(settings, &target.endpoint, refresh_interval)?;
    let mut rx = paginator.subscribe();

    let view = paginator.select(target.query, target.filter, target.page).await;
    rx.mark_unchanged();
    print_view(&view)?;
    let mut printed = 1_usize;

    if refresh_interval.is_none() {
        tracing::info!("refresh interval is 0, polling disabled");
        return Ok(());
    }
    if max_updates.is_some_and(|max| printed >= max) {
        return Ok(());
    }

    let handle = paginator.start();
    tracing::info!(endpoint = %target.endpoint, interval_ms = settings.refresh_ms, "watching");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = rx.borrow_and_update().clone();
                print_view(&view)?;
                printed = printed.saturating_add(1);
                if max_updates.is_some_and(|max| printed >= max) {
                    break;
                }
            },
            _ = &mut shutdown => {
                tracing::info!("interrupted, stopping");
                break;
            },
        }
    }

    handle.stop();
    Ok(())
}
