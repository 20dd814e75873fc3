//! One-shot aggregation run. Prints the kept items as JSON on stdout; logs go
//! to stderr.

use anyhow::Result;
use clap::Parser;
use kickoff::{
    aggregator::{AggregationRunner, Aggregator},
    config::{Config, load_sources},
    repositories::{MemoryNewsStore, NewsStore, PgNewsStore},
    telemetry::init_tracing,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Keep results in memory instead of writing to the database
    #[arg(long)]
    dry_run: bool,

    /// JSON file of `{name, url, category}` sources, overriding NEWS_SOURCES_PATH
    #[arg(short, long)]
    sources: Option<String>,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = cli.sources.as_deref() {
        config = config.with_sources(load_sources(path)?);
    }

    let store: Arc<dyn NewsStore> = if cli.dry_run {
        Arc::new(MemoryNewsStore::new())
    } else {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(config.database_url())
            .await?;
        let store = PgNewsStore::new(pool);
        info!(stored = store.count().await?, "Connected to news store");
        Arc::new(store)
    };

    let runner = AggregationRunner::new(Aggregator::from_config(&config)?, store);
    let outcome = runner.trigger().await?;

    info!(
        count = outcome.report.items.len(),
        inserted = outcome.inserted,
        sources_ok = outcome.report.sources_ok,
        sources_failed = ?outcome.report.sources_failed,
        dry_run = cli.dry_run,
        "Aggregation complete"
    );

    let json = if cli.pretty {
        serde_json::to_string_pretty(&outcome.report.items)?
    } else {
        serde_json::to_string(&outcome.report.items)?
    };
    println!("{}", json);

    Ok(())
}
