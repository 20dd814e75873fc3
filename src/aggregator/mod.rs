pub mod filter;
pub mod normalize;
pub mod orchestrator;
pub mod runner;
pub mod types;

pub use filter::{DEFAULT_KEYWORDS, FilterStats, PublishedIndex, RelevanceFilter};
pub use normalize::{Normalizer, clean_summary, clean_title, dedup_key};
pub use orchestrator::{AggregationReport, Aggregator};
pub use runner::{AggregationRunner, RunError, RunOutcome};
pub use types::NormalizedNewsItem;
