use anyhow::Result;
use kickoff::{
    aggregator::{AggregationRunner, Aggregator},
    config::Config,
    jobs::{Scheduler, SchedulerConfig},
    repositories::PgNewsStore,
    telemetry::init_tracing,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url())
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = PgNewsStore::new(pool);
    info!(stored = store.count().await?, "News store ready");

    let runner = AggregationRunner::new(Aggregator::from_config(&config)?, Arc::new(store));

    let scheduler = Scheduler::new(
        runner,
        SchedulerConfig {
            startup_delay: config.startup_delay(),
            interval: config.aggregation_interval(),
        },
    );
    scheduler.listen_for_ctrl_c();
    scheduler.run().await;

    Ok(())
}
