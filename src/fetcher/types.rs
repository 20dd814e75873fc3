use serde::{Deserialize, Serialize};

/// A configured feed: where to fetch it and how to label what it yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub category: String,
}

impl FeedSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: category.into(),
        }
    }
}

/// One `<item>` / `<entry>` exactly as the feed published it.
///
/// Text fields are entity-decoded but otherwise untouched; HTML inside
/// descriptions and content is preserved for the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedItem {
    pub title: String,
    pub link: String,
    pub guid: Option<String>,
    pub published_at: Option<String>,
    /// `description` (RSS) or `summary` (Atom).
    pub html_summary: Option<String>,
    /// `content` (Atom or plain RSS extension).
    pub raw_content: Option<String>,
    /// `content:encoded`.
    pub content_encoded: Option<String>,
    pub enclosure_url: Option<String>,
    /// Every `media:content@url`, in document order.
    pub media_content_urls: Vec<String>,
    pub media_thumbnail_url: Option<String>,
    /// A generic `image` element on the item.
    pub image_url: Option<String>,
}

/// A parsed feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    /// Channel `lastBuildDate`/`pubDate` or feed `updated`, verbatim.
    pub last_updated: Option<String>,
    pub items: Vec<RawFeedItem>,
}
