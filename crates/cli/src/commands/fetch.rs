use anyhow::Result;
use pagewatch_core::EnvSettings;

use super::{PageTarget, build_paginator, print_view};

pub(crate) async fn run_fetch(settings: &EnvSettings, target: PageTarget) -> Result<()> {
    let paginator = build_paginator(settings, &target.endpoint, None)?;
    let view = paginator.select(target.query, target.filter, target.page).await;
    if let Some(error) = &view.error {
        anyhow::bail!("failed to fetch {}: {error}", target.endpoint);
    }
    print_view(&view)
}
