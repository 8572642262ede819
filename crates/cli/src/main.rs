mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pagewatch_core::{EnvSettings, Filter};
use tracing_subscriber::EnvFilter;

use crate::commands::PageTarget;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "pagewatch")]
#[command(about = "Fetch and live-poll paginated admin endpoints", long_about = None)]
struct Cli {
    /// Backend base URL [env: PAGEWATCH_BASE_URL]
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PageArgs {
    /// Endpoint path, e.g. /api/manage/admin/cc-pair/1/index-attempts
    endpoint: String,
    /// 1-based page to show
    #[arg(short, long, default_value = "1")]
    page: usize,
    /// Free-text query sent as `q`
    #[arg(short, long)]
    query: Option<String>,
    /// Filter as key=value; repeat a key to send a list
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,
    /// Rows per page [env: PAGEWATCH_ITEMS_PER_PAGE]
    #[arg(long)]
    items_per_page: Option<usize>,
    /// Pages fetched per request [env: PAGEWATCH_PAGES_PER_BATCH]
    #[arg(long)]
    pages_per_batch: Option<usize>,
}

impl PageArgs {
    fn into_target(self, settings: &mut EnvSettings) -> Result<PageTarget> {
        if let Some(items_per_page) = self.items_per_page {
            settings.items_per_page = items_per_page;
        }
        if let Some(pages_per_batch) = self.pages_per_batch {
            settings.pages_per_batch = pages_per_batch;
        }
        Ok(PageTarget {
            endpoint: self.endpoint,
            page: self.page,
            query: self.query,
            filter: Filter::from_assignments(&self.filters)?,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page and print it as JSON
    Fetch {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Keep a page fresh and print it every time it changes
    Watch {
        #[command(flatten)]
        page: PageArgs,
        /// Polling interval in milliseconds, 0 disables polling [env: PAGEWATCH_REFRESH_MS]
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Stop after printing this many views
        #[arg(long)]
        max_updates: Option<usize>,
    },
    /// Serve the paginated endpoints from a JSON fixture
    Serve {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(short, long, default_value = "8080")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG, when set, replaces the default level entirely
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut settings = EnvSettings::from_env();
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }

    match cli.command {
        Commands::Fetch { page } => {
            let target = page.into_target(&mut settings)?;
            commands::fetch::run_fetch(&settings, target).await?;
        },
        Commands::Watch { page, interval_ms, max_updates } => {
            let target = page.into_target(&mut settings)?;
            if let Some(interval_ms) = interval_ms {
                settings.refresh_ms = interval_ms;
            }
            commands::watch::run_watch(&settings, target, max_updates).await?;
        },
        Commands::Serve { fixture, port, host } => {
            commands::serve::run(&fixture, &host, port).await?;
        },
    }

    Ok(())
}
