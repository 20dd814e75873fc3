#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use kickoff::{
    aggregator::NormalizedNewsItem,
    fetcher::{FeedError, FeedSource, RawFeedItem, SourceFetcher},
    resolver::ImageResolver,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves canned items per source URL; unknown URLs fail like a dead host.
#[derive(Default)]
pub struct StubFetcher {
    feeds: HashMap<String, Vec<RawFeedItem>>,
    calls: AtomicUsize,
    delay: std::time::Duration,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, items: Vec<RawFeedItem>) -> Self {
        self.feeds.insert(url.to_string(), items);
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.feeds
            .get(&source.url)
            .cloned()
            .ok_or_else(|| FeedError::Network(format!("connection refused: {}", source.url)))
    }
}

/// Answers every page with the same image and records what was asked.
#[derive(Default)]
pub struct StubResolver {
    image: String,
    requested: Mutex<Vec<String>>,
}

impl StubResolver {
    pub fn returning(image: &str) -> Self {
        Self {
            image: image.to_string(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageResolver for StubResolver {
    async fn resolve(&self, page_url: &str) -> String {
        self.requested.lock().unwrap().push(page_url.to_string());
        self.image.clone()
    }
}

pub fn raw_item(title: &str, link: &str, published: DateTime<Utc>) -> RawFeedItem {
    RawFeedItem {
        title: title.to_string(),
        link: link.to_string(),
        published_at: Some(published.to_rfc2822()),
        html_summary: Some(format!("<p>{}</p>", title)),
        ..Default::default()
    }
}

pub fn stored_item(title: &str, link: &str) -> NormalizedNewsItem {
    NormalizedNewsItem {
        source_name: "Archive".to_string(),
        title: title.to_string(),
        summary: String::new(),
        link: link.to_string(),
        image_url: String::new(),
        category: "RDC".to_string(),
        published_at: Utc::now() - Duration::days(10),
        dedup_key: kickoff::aggregator::dedup_key(title),
        date_estimated: false,
    }
}

pub fn rss(items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Test feed</title>
    <lastBuildDate>Sat, 17 Oct 2026 10:00:00 +0000</lastBuildDate>
    {}
  </channel>
</rss>"#,
        items
    )
}
