use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::aggregator::normalize::dedup_key;
use crate::aggregator::types::NormalizedNewsItem;

/// Topic keywords, matched case-insensitively as substrings of title + summary.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "football",
    "foot",
    "ballon",
    "mercato",
    "ligue",
    "match",
    "joueur",
    "club",
    "fifa",
    "caf",
    "leopards",
    "léopards",
    "congolais",
    "transfert",
    "but",
    "attaquant",
    "stade",
    "champions",
    "coupe",
    "real",
    "barca",
    "psg",
];

pub const DEFAULT_FRESHNESS_DAYS: i64 = 5;

/// Links and titles already stored by earlier runs.
///
/// Entries that look like URLs are matched against item links, everything
/// else against the item's dedup key.
#[derive(Debug, Clone, Default)]
pub struct PublishedIndex {
    links: HashSet<String>,
    keys: HashSet<String>,
}

impl PublishedIndex {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            if entry.starts_with("http://") || entry.starts_with("https://") {
                index.links.insert(entry.to_string());
            } else {
                index.keys.insert(dedup_key(entry));
            }
        }
        index
    }

    pub fn len(&self) -> usize {
        self.links.len() + self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: &NormalizedNewsItem) -> bool {
        (!item.link.is_empty() && self.links.contains(&item.link))
            || self.keys.contains(&item.dedup_key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterStats {
    pub kept: usize,
    pub off_topic: usize,
    pub stale: usize,
    pub persisted_duplicates: usize,
    pub batch_duplicates: usize,
}

impl FilterStats {
    pub fn rejected(&self) -> usize {
        self.off_topic + self.stale + self.persisted_duplicates + self.batch_duplicates
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
    freshness: Duration,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_KEYWORDS.iter().copied(),
            Duration::days(DEFAULT_FRESHNESS_DAYS),
        )
    }
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I, freshness: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords, freshness }
    }

    /// An empty keyword list accepts everything.
    pub fn is_on_topic(&self, item: &NormalizedNewsItem) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let haystack = format!("{} {}", item.title, item.summary).to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    /// Items with an estimated date, or a date in the future, count as fresh.
    pub fn is_fresh(&self, item: &NormalizedNewsItem, now: DateTime<Utc>) -> bool {
        if item.date_estimated {
            return true;
        }
        now.signed_duration_since(item.published_at) <= self.freshness
    }

    /// Keep on-topic, fresh items that are neither already stored nor repeated
    /// within the batch. The first occurrence of a repeated item wins.
    pub fn apply(
        &self,
        items: Vec<NormalizedNewsItem>,
        published: &PublishedIndex,
        now: DateTime<Utc>,
    ) -> (Vec<NormalizedNewsItem>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut seen_links: HashSet<String> = HashSet::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut kept = Vec::with_capacity(items.len());

        for item in items {
            if !self.is_on_topic(&item) {
                stats.off_topic += 1;
                continue;
            }
            if !self.is_fresh(&item, now) {
                stats.stale += 1;
                continue;
            }
            if published.contains(&item) {
                stats.persisted_duplicates += 1;
                continue;
            }

            let repeated_link = !item.link.is_empty() && seen_links.contains(&item.link);
            if repeated_link || seen_keys.contains(&item.dedup_key) {
                stats.batch_duplicates += 1;
                continue;
            }

            if !item.link.is_empty() {
                seen_links.insert(item.link.clone());
            }
            seen_keys.insert(item.dedup_key.clone());
            kept.push(item);
        }

        stats.kept = kept.len();
        debug!(
            kept = stats.kept,
            off_topic = stats.off_topic,
            stale = stats.stale,
            persisted_duplicates = stats.persisted_duplicates,
            batch_duplicates = stats.batch_duplicates,
            "Filtered aggregation batch"
        );
        (kept, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn item(title: &str, link: &str, age_days: i64) -> NormalizedNewsItem {
        NormalizedNewsItem {
            source_name: "FOOT.CD".into(),
            title: title.into(),
            summary: String::new(),
            link: link.into(),
            image_url: String::new(),
            category: "RDC".into(),
            published_at: now() - Duration::days(age_days),
            dedup_key: dedup_key(title),
            date_estimated: false,
        }
    }

    #[test]
    fn test_recency_window() {
        let filter = RelevanceFilter::default();
        assert!(filter.is_fresh(&item("match", "https://a", 4), now()));
        assert!(!filter.is_fresh(&item("match", "https://a", 6), now()));
        assert!(filter.is_fresh(&item("match", "https://a", -1), now()));

        let mut estimated = item("match", "https://a", 30);
        estimated.date_estimated = true;
        assert!(filter.is_fresh(&estimated, now()));
    }

    #[test]
    fn test_keyword_gate() {
        let filter = RelevanceFilter::default();
        assert!(filter.is_on_topic(&item("Ligue 1: transfert surprise", "", 0)));
        assert!(!filter.is_on_topic(&item("Weather forecast for Paris", "", 0)));

        let mut in_summary = item("Surprise à Kinshasa", "", 0);
        in_summary.summary = "Les LÉOPARDS ont gagné".into();
        assert!(filter.is_on_topic(&in_summary));
    }

    #[test]
    fn test_empty_keyword_list_accepts_everything() {
        let filter = RelevanceFilter::new(Vec::<String>::new(), Duration::days(5));
        assert!(filter.is_on_topic(&item("Weather forecast for Paris", "", 0)));
    }

    #[test]
    fn test_persisted_duplicates_by_link_and_title() {
        let filter = RelevanceFilter::default();
        let published = PublishedIndex::from_entries([
            "https://foot.cd/old",
            "Le PSG remporte le match",
        ]);
        assert_eq!(published.len(), 2);

        let items = vec![
            item("Un autre match", "https://foot.cd/old", 0),
            item("LE PSG REMPORTE LE MATCH", "https://foot.cd/new", 0),
            item("Nouveau match", "https://foot.cd/fresh", 0),
        ];
        let (kept, stats) = filter.apply(items, &published, now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].link, "https://foot.cd/fresh");
        assert_eq!(stats.persisted_duplicates, 2);
    }

    #[test]
    fn test_batch_duplicates_keep_first() {
        let filter = RelevanceFilter::default();
        let items = vec![
            item("Mercato: Mbappé au Real", "https://a/1", 0),
            item("Mercato: Mbappé au Real", "https://b/1", 0),
            item("Club en crise", "https://a/1", 0),
            item("Club sans lien", "", 0),
            item("Autre club sans lien", "", 0),
        ];
        let (kept, stats) = filter.apply(items, &PublishedIndex::default(), now());
        let links: Vec<_> = kept.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            links,
            vec!["Mercato: Mbappé au Real", "Club sans lien", "Autre club sans lien"]
        );
        assert_eq!(stats.batch_duplicates, 2);
        assert_eq!(stats.kept, 3);
    }

    #[test]
    fn test_stats_account_for_every_item() {
        let filter = RelevanceFilter::default();
        let items = vec![
            item("Weather forecast", "https://a/0", 0),
            item("Vieux match", "https://a/1", 10),
            item("Match du jour", "https://a/2", 1),
            item("Match du jour", "https://a/3", 1),
        ];
        let (kept, stats) = filter.apply(items, &PublishedIndex::default(), now());
        assert_eq!(kept.len(), 1);
        assert_eq!(stats.off_topic, 1);
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.batch_duplicates, 1);
        assert_eq!(stats.kept + stats.rejected(), 4);
    }
}
