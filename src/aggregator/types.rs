use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The canonical record produced by one aggregation pass.
///
/// Serializes as `{source, title, summary, link, imageUrl, category, date}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedNewsItem {
    #[serde(rename = "source")]
    pub source_name: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    /// Absolute URL, or the configured placeholder (empty by default).
    pub image_url: String,
    pub category: String,
    #[serde(rename = "date")]
    pub published_at: DateTime<Utc>,
    #[serde(skip)]
    pub dedup_key: String,
    /// The feed date was missing or unparseable and `published_at` is the run time.
    #[serde(skip)]
    pub date_estimated: bool,
}
