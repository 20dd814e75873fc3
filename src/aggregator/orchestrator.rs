use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::aggregator::filter::{FilterStats, PublishedIndex, RelevanceFilter};
use crate::aggregator::normalize::Normalizer;
use crate::aggregator::types::NormalizedNewsItem;
use crate::config::Config;
use crate::fetcher::{FeedError, FeedFetcher, FeedSource, HttpSettings, SourceFetcher};
use crate::resolver::{HttpImageResolver, ImageResolver};

/// Everything one aggregation pass produced.
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// Kept items, newest first.
    pub items: Vec<NormalizedNewsItem>,
    pub sources_ok: usize,
    pub sources_failed: Vec<String>,
    pub stats: FilterStats,
}

/// Fetches every source, normalizes, filters the merged batch and fills in
/// missing images for the survivors.
#[derive(Clone)]
pub struct Aggregator {
    fetcher: Arc<dyn SourceFetcher>,
    resolver: Arc<dyn ImageResolver>,
    normalizer: Normalizer,
    filter: RelevanceFilter,
    sources: Vec<FeedSource>,
    feed_concurrency: usize,
    image_concurrency: usize,
}

impl Aggregator {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        resolver: Arc<dyn ImageResolver>,
        sources: Vec<FeedSource>,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            normalizer: Normalizer::default(),
            filter: RelevanceFilter::default(),
            sources,
            feed_concurrency: 4,
            image_concurrency: 8,
        }
    }

    /// Wire the HTTP fetcher and resolver from configuration.
    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        let fetcher = FeedFetcher::new(&HttpSettings::for_feeds(config.feed_timeout()))?;
        let resolver = HttpImageResolver::new(&HttpSettings::for_pages(
            config.image_timeout(),
            config.image_max_bytes(),
        ))
        .map_err(FeedError::from_reqwest_error)?;

        Ok(Self::new(Arc::new(fetcher), Arc::new(resolver), config.sources().to_vec())
            .with_normalizer(Normalizer::new(config.default_image_url()))
            .with_filter(RelevanceFilter::new(
                crate::aggregator::DEFAULT_KEYWORDS.iter().copied(),
                config.freshness(),
            ))
            .with_concurrency(config.feed_concurrency(), config.image_concurrency()))
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_filter(mut self, filter: RelevanceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Zero is treated as one.
    pub fn with_concurrency(mut self, feeds: usize, images: usize) -> Self {
        self.feed_concurrency = feeds.max(1);
        self.image_concurrency = images.max(1);
        self
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub async fn run(&self, published: &PublishedIndex) -> AggregationReport {
        self.run_at(published, Utc::now()).await
    }

    /// One pass with an explicit clock. Never fails: a source that cannot be
    /// fetched is logged and recorded in `sources_failed`.
    #[instrument(skip_all, fields(sources = self.sources.len(), baseline = published.len()))]
    pub async fn run_at(&self, published: &PublishedIndex, now: DateTime<Utc>) -> AggregationReport {
        let fetched: Vec<_> = stream::iter(self.sources.iter().cloned())
            .map(|source| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = fetcher.fetch(&source).await;
                    (source, result)
                }
            })
            .buffered(self.feed_concurrency)
            .collect()
            .await;

        let mut report = AggregationReport::default();
        let mut batch = Vec::new();

        for (source, result) in fetched {
            match result {
                Ok(items) => {
                    info!(source = %source.name, count = items.len(), "Fetched feed");
                    report.sources_ok += 1;
                    batch.extend(
                        items
                            .iter()
                            .map(|item| self.normalizer.normalize_offline(item, &source, now)),
                    );
                }
                Err(e) => {
                    warn!(
                        source = %source.name,
                        url = %source.url,
                        kind = ?e.kind(),
                        error = %e,
                        "Feed fetch failed, skipping source"
                    );
                    report.sources_failed.push(source.name.clone());
                }
            }
        }

        let (kept, stats) = self.filter.apply(batch, published, now);

        let mut items: Vec<NormalizedNewsItem> = stream::iter(kept)
            .map(|mut item| {
                let normalizer = self.normalizer.clone();
                let resolver = Arc::clone(&self.resolver);
                async move {
                    normalizer.complete_image(&mut item, resolver.as_ref()).await;
                    item
                }
            })
            .buffered(self.image_concurrency)
            .collect()
            .await;

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        info!(
            kept = stats.kept,
            off_topic = stats.off_topic,
            stale = stats.stale,
            persisted_duplicates = stats.persisted_duplicates,
            batch_duplicates = stats.batch_duplicates,
            sources_ok = report.sources_ok,
            sources_failed = report.sources_failed.len(),
            "Aggregation pass complete"
        );

        report.items = items;
        report.stats = stats;
        report
    }
}
