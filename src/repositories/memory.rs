use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use super::news::NewsStore;
use crate::aggregator::NormalizedNewsItem;
use crate::entities::PersistedNewsRecord;

/// Process-local store with the same conflict rule as the `news` table.
///
/// Backs `aggregate --dry-run` and tests.
#[derive(Debug, Default)]
pub struct MemoryNewsStore {
    records: Mutex<Vec<PersistedNewsRecord>>,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with items as if an earlier run had stored them.
    pub fn with_items(items: &[NormalizedNewsItem]) -> Self {
        let now = Utc::now();
        Self {
            records: Mutex::new(
                items
                    .iter()
                    .map(|item| PersistedNewsRecord::from_item(item, now))
                    .collect(),
            ),
        }
    }

    pub fn records(&self) -> Vec<PersistedNewsRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn find_titles_or_links(&self) -> Result<HashSet<String>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .flat_map(|r| [r.title.clone(), r.link.clone()])
            .filter(|v| !v.is_empty())
            .collect())
    }

    async fn bulk_insert(&self, items: &[NormalizedNewsItem]) -> Result<u64> {
        let now = Utc::now();
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut hashes: HashSet<String> = records.iter().map(|r| r.link_hash.clone()).collect();

        let mut inserted = 0;
        for item in items {
            let record = PersistedNewsRecord::from_item(item, now);
            if hashes.insert(record.link_hash.clone()) {
                records.push(record);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, link: &str) -> NormalizedNewsItem {
        NormalizedNewsItem {
            source_name: "S".into(),
            title: title.into(),
            summary: String::new(),
            link: link.into(),
            image_url: String::new(),
            category: "RDC".into(),
            published_at: Utc::now(),
            dedup_key: title.to_lowercase(),
            date_estimated: false,
        }
    }

    #[tokio::test]
    async fn conflicting_link_hashes_are_skipped() {
        let store = MemoryNewsStore::new();
        let first = store
            .bulk_insert(&[item("A", "https://x/1"), item("B", "https://x/2")])
            .await
            .unwrap();
        assert_eq!(first, 2);

        let second = store
            .bulk_insert(&[
                item("A bis", "https://x/1"),
                item("C", ""),
                item("C", ""),
            ])
            .await
            .unwrap();
        assert_eq!(second, 1);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn baseline_contains_titles_and_links() {
        let store = MemoryNewsStore::with_items(&[item("A", "https://x/1"), item("B", "")]);
        let baseline = store.find_titles_or_links().await.unwrap();
        assert_eq!(
            baseline,
            HashSet::from(["A".to_string(), "https://x/1".to_string(), "B".to_string()])
        );
    }
}
