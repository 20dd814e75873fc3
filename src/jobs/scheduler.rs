use std::time::Duration;
use tokio::signal;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::aggregator::AggregationRunner;

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub startup_delay: Duration,
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(10),
            interval: Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// Fires an aggregation run shortly after startup and then on a fixed interval.
pub struct Scheduler {
    runner: AggregationRunner,
    config: SchedulerConfig,
    shutdown_token: CancellationToken,
}

impl Scheduler {
    pub fn new(runner: AggregationRunner, config: SchedulerConfig) -> Self {
        Self {
            runner,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Share an existing token, e.g. the HTTP server's shutdown token.
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Cancel the token on Ctrl-C.
    pub fn listen_for_ctrl_c(&self) {
        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown_token.cancel();
        });
    }

    /// Run until the shutdown token is cancelled. Returns the number of runs
    /// that were started.
    pub async fn run(self) -> u64 {
        info!(
            startup_delay_secs = self.config.startup_delay.as_secs(),
            interval_secs = self.config.interval.as_secs(),
            "Starting aggregation scheduler"
        );

        let start = Instant::now() + self.config.startup_delay;
        let mut ticker = interval_at(start, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut runs = 0;
        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    runs += 1;
                    // An in-flight run keeps going on shutdown; only the wait is abandoned.
                    tokio::select! {
                        _ = self.shutdown_token.cancelled() => {
                            info!("Scheduler shutting down during a run");
                            break;
                        }
                        result = self.runner.trigger() => match result {
                            Ok(outcome) => info!(
                                count = outcome.report.items.len(),
                                inserted = outcome.inserted,
                                sources_failed = outcome.report.sources_failed.len(),
                                "Scheduled aggregation complete"
                            ),
                            Err(e) => warn!(error = %e, "Scheduled aggregation failed"),
                        },
                    }
                }
            }
        }
        runs
    }
}
