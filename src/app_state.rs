use std::sync::Arc;
use std::time::Instant;

use crate::aggregator::AggregationRunner;
use crate::fetcher::FeedFetcher;
use crate::repositories::NewsStore;

#[derive(Clone)]
pub struct AppState {
    pub runner: AggregationRunner,
    pub store: Arc<dyn NewsStore>,
    /// Used by source verification; independent of the aggregation fetcher.
    pub verifier: FeedFetcher,
    pub environment: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        runner: AggregationRunner,
        verifier: FeedFetcher,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            store: Arc::clone(runner.store()),
            runner,
            verifier,
            environment: environment.into(),
            started_at: Instant::now(),
        }
    }
}
