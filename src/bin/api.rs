use anyhow::Result;
use kickoff::{
    aggregator::{AggregationRunner, Aggregator},
    app_state::AppState,
    config::Config,
    fetcher::{FeedFetcher, HttpSettings},
    jobs::{Scheduler, SchedulerConfig},
    repositories::{NewsStore, PgNewsStore},
    router::build_router,
    telemetry::init_tracing,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url())
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store: Arc<dyn NewsStore> = Arc::new(PgNewsStore::new(pool));
    let runner = AggregationRunner::new(Aggregator::from_config(&config)?, store);
    let verifier = FeedFetcher::new(&HttpSettings::for_feeds(config.feed_timeout()))?;
    let state = AppState::new(runner.clone(), verifier, config.environment());

    let scheduler = Scheduler::new(
        runner,
        SchedulerConfig {
            startup_delay: config.startup_delay(),
            interval: config.aggregation_interval(),
        },
    );
    scheduler.listen_for_ctrl_c();
    let shutdown_token = scheduler.shutdown_token();
    let scheduler_handle = tokio::spawn(scheduler.run());

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %config.bind_addr(),
        sources = config.sources().len(),
        environment = %config.environment(),
        "Listening"
    );

    let server_token = shutdown_token.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await?;

    shutdown_token.cancel();
    let runs = scheduler_handle.await?;
    info!(runs, "Shut down");
    Ok(())
}
