use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};
use std::collections::HashSet;
use tracing::debug;

use crate::aggregator::NormalizedNewsItem;
use crate::entities::PersistedNewsRecord;

/// Rows per multi-row INSERT statement.
pub const BULK_INSERT_CHUNK: usize = 500;

/// Persisted news store used by aggregation runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Every stored title and every non-empty stored link.
    async fn find_titles_or_links(&self) -> Result<HashSet<String>>;

    /// Insert items, skipping any whose link hash is already stored.
    /// Returns the number of rows actually written.
    async fn bulk_insert(&self, items: &[NormalizedNewsItem]) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct PgNewsStore {
    pool: Pool<Postgres>,
}

impl PgNewsStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Total stored rows.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl NewsStore for PgNewsStore {
    async fn find_titles_or_links(&self) -> Result<HashSet<String>> {
        let values = sqlx::query_scalar::<_, String>(
            r#"
            SELECT title FROM news WHERE title <> ''
            UNION
            SELECT link FROM news WHERE link <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(values.into_iter().collect())
    }

    async fn bulk_insert(&self, items: &[NormalizedNewsItem]) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let records: Vec<PersistedNewsRecord> = items
            .iter()
            .map(|item| PersistedNewsRecord::from_item(item, now))
            .collect();

        let mut inserted = 0;
        for chunk in records.chunks(BULK_INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO news (id, link_hash, source, category, title, summary, link, \
                 image_url, dedup_key, published_at, published, created_at) ",
            );
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.id)
                    .push_bind(&record.link_hash)
                    .push_bind(&record.source)
                    .push_bind(&record.category)
                    .push_bind(&record.title)
                    .push_bind(&record.summary)
                    .push_bind(&record.link)
                    .push_bind(&record.image_url)
                    .push_bind(&record.dedup_key)
                    .push_bind(record.published_at)
                    .push_bind(record.published)
                    .push_bind(record.created_at);
            });
            builder.push(" ON CONFLICT (link_hash) DO NOTHING");

            let result = builder.build().execute(&self.pool).await?;
            debug!(
                rows = chunk.len(),
                inserted = result.rows_affected(),
                "Inserted news chunk"
            );
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
