use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::aggregator::NormalizedNewsItem;

/// A row of the `news` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PersistedNewsRecord {
    pub id: Uuid,
    /// Hex MD5 of the link, or of the title when the link is empty.
    pub link_hash: String,
    pub source: String,
    pub category: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    pub image_url: String,
    pub dedup_key: String,
    pub published_at: DateTime<Utc>,
    /// Editorial flag; aggregation always inserts unpublished rows.
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl PersistedNewsRecord {
    pub fn from_item(item: &NormalizedNewsItem, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            link_hash: link_hash(item),
            source: item.source_name.clone(),
            category: item.category.clone(),
            title: item.title.clone(),
            summary: item.summary.clone(),
            link: item.link.clone(),
            image_url: item.image_url.clone(),
            dedup_key: item.dedup_key.clone(),
            published_at: item.published_at,
            published: false,
            created_at,
        }
    }
}

pub fn link_hash(item: &NormalizedNewsItem) -> String {
    let basis = if item.link.is_empty() {
        &item.title
    } else {
        &item.link
    };
    format!("{:x}", md5::compute(basis.as_bytes()))
}
