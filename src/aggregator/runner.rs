use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{Instrument, error, info, info_span};

use crate::aggregator::filter::PublishedIndex;
use crate::aggregator::orchestrator::{AggregationReport, Aggregator};
use crate::repositories::NewsStore;

/// Failures that leave a run without a usable result.
///
/// Individual feed failures are never run errors.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error("failed to load already published news: {0}")]
    Baseline(String),

    #[error("failed to persist aggregated news: {0}")]
    Persistence(String),

    #[error("aggregation run aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: AggregationReport,
    /// Rows written by this run; lower than `report.items.len()` when a
    /// concurrent writer stored the same links first.
    pub inserted: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

type RunResult = Result<Arc<RunOutcome>, RunError>;
type SharedRun = Shared<BoxFuture<'static, RunResult>>;

struct Inner {
    aggregator: Aggregator,
    store: Arc<dyn NewsStore>,
    in_flight: Mutex<Option<SharedRun>>,
}

/// Runs aggregation passes one at a time and persists their results.
///
/// Callers that trigger while a run is in progress join that run instead of
/// starting another.
#[derive(Clone)]
pub struct AggregationRunner {
    inner: Arc<Inner>,
}

impl AggregationRunner {
    pub fn new(aggregator: Aggregator, store: Arc<dyn NewsStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                aggregator,
                store,
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn NewsStore> {
        &self.inner.store
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start a run, or join the one already in flight.
    ///
    /// The run is spawned onto the runtime, so dropping the returned future
    /// does not cancel it.
    pub async fn trigger(&self) -> RunResult {
        let run = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match slot.as_ref() {
                Some(run) => {
                    info!("Aggregation already running, joining it");
                    run.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let handle = tokio::spawn(async move {
                        let _clear = ClearOnDrop(Arc::clone(&inner));
                        inner.execute().await.map(Arc::new)
                    });
                    let run: SharedRun = async move {
                        handle
                            .await
                            .unwrap_or_else(|e| Err(RunError::Aborted(e.to_string())))
                    }
                    .boxed()
                    .shared();
                    *slot = Some(run.clone());
                    run
                }
            }
        };

        run.await
    }
}

impl Inner {
    async fn execute(&self) -> Result<RunOutcome, RunError> {
        let started_at = Utc::now();
        let span = info_span!("aggregation_run", started_at = %started_at);

        async {
            let baseline = self.store.find_titles_or_links().await.map_err(|e| {
                error!(error = %e, "Failed to load published news");
                RunError::Baseline(format!("{:#}", e))
            })?;
            let published = PublishedIndex::from_entries(baseline);

            let report = self.aggregator.run_at(&published, started_at).await;

            let inserted = self.store.bulk_insert(&report.items).await.map_err(|e| {
                error!(error = %e, count = report.items.len(), "Failed to persist news");
                RunError::Persistence(format!("{:#}", e))
            })?;

            let finished_at = Utc::now();
            info!(
                count = report.items.len(),
                inserted,
                sources_failed = report.sources_failed.len(),
                elapsed_ms = (finished_at - started_at).num_milliseconds(),
                "Aggregation run finished"
            );

            Ok(RunOutcome {
                report,
                inserted,
                started_at,
                finished_at,
            })
        }
        .instrument(span)
        .await
    }
}

/// Frees the in-flight slot when the spawned run ends, even by panic.
struct ClearOnDrop(Arc<Inner>);

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        self.0
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
