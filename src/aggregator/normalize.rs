//! Turns raw feed items into [`NormalizedNewsItem`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::aggregator::types::NormalizedNewsItem;
use crate::fetcher::{FeedSource, RawFeedItem};
use crate::resolver::ImageResolver;

pub const SUMMARY_MAX_CHARS: usize = 200;
pub const DEDUP_KEY_CHARS: usize = 50;
const ELLIPSIS: &str = "...";

const TITLE_DELIMITERS: &[&str] = &[" - ", " | ", " — "];

const KNOWN_SITE_NAMES: &[&str] = &[
    "Foot Mercato",
    "Maxifoot",
    "So Foot",
    "L'Equipe",
    "L'Équipe",
    "RFI",
    "Radio Okapi",
    "Google News",
];

static SITE_SUFFIX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    KNOWN_SITE_NAMES
        .iter()
        .map(|site| Regex::new(&format!(r"(?i)[\s\-\p{{Pd}}|:]+{}$", regex::escape(site))).unwrap())
        .collect()
});

static BARE_IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>]+?\.(?:jpe?g|png|gif|webp)(?:\?[^\s"'<>]*)?"#).unwrap()
});

/// Strip a trailing "site name" segment and known publisher suffixes.
///
/// The title is cut at the earliest of the *last* occurrences of each
/// delimiter, so `"A - B - C"` keeps `"A - B"`: only the final segment is
/// treated as a site name.
pub fn clean_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return String::new();
    }

    let cut = TITLE_DELIMITERS
        .iter()
        .filter_map(|delimiter| title.rfind(delimiter))
        .min();

    let mut cleaned = match cut {
        Some(index) => title[..index].to_string(),
        None => title.to_string(),
    };

    for pattern in SITE_SUFFIX_PATTERNS.iter() {
        cleaned = pattern.replace(&cleaned, "").into_owned();
    }

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        title.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Plain-text summary, at most [`SUMMARY_MAX_CHARS`] characters plus an ellipsis.
pub fn clean_summary(html: &str) -> String {
    let text = html_to_text(html);
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text;
    }

    let mut truncated: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);
    truncated
}

pub fn dedup_key(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .take(DEDUP_KEY_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn embedded_image(html: &str) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty() && !src.starts_with("data:"))
        .map(str::to_string)
}

fn bare_image_url(text: &str) -> Option<String> {
    BARE_IMAGE_URL.find(text).map(|m| m.as_str().to_string())
}

/// Rebuild a relative image reference on the feed's own scheme and host.
///
/// Returns `None` for references that cannot be made into an http(s) URL.
pub fn absolutize_image(candidate: &str, source_url: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let lower = candidate.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(candidate.to_string());
    }

    let base = Url::parse(source_url).ok()?;
    if let Some(rest) = candidate.strip_prefix("//") {
        return Some(format!("{}://{}", base.scheme(), rest));
    }

    // Any other scheme (data:, javascript:, ...) is not an image we can serve.
    if candidate.split(['/', '?', '#']).next().is_some_and(|head| head.contains(':')) {
        return None;
    }

    let host = base.host_str()?;
    let origin = match base.port() {
        Some(port) => format!("{}://{}:{}", base.scheme(), host, port),
        None => format!("{}://{}", base.scheme(), host),
    };
    Some(format!("{}/{}", origin, candidate.trim_start_matches('/')))
}

pub fn parse_published(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%a, %d %b %Y %H:%M:%S",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }

    // RFC 2822 with a zone abbreviation chrono does not know ("CEST", "WAT").
    if let Some((head, _zone)) = raw.rsplit_once(' ') {
        if let Ok(dt) = NaiveDateTime::parse_from_str(head, "%a, %d %b %Y %H:%M:%S") {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    default_image_url: String,
}

impl Normalizer {
    pub fn new(default_image_url: impl Into<String>) -> Self {
        Self {
            default_image_url: default_image_url.into(),
        }
    }

    /// Normalize using only what the feed itself carries.
    ///
    /// `image_url` is left empty when no feed-embedded image exists; pass the
    /// item to [`Normalizer::complete_image`] to run the page-scraping fallback.
    pub fn normalize_offline(
        &self,
        item: &RawFeedItem,
        source: &FeedSource,
        now: DateTime<Utc>,
    ) -> NormalizedNewsItem {
        let title = clean_title(&item.title);

        let link = if item.link.trim().is_empty() {
            item.guid
                .as_deref()
                .filter(|guid| guid.starts_with("http"))
                .unwrap_or_default()
                .trim()
                .to_string()
        } else {
            item.link.trim().to_string()
        };

        let summary = richest_text(item).map(clean_summary).unwrap_or_default();

        let image_url = feed_image(item)
            .and_then(|candidate| absolutize_image(&candidate, &source.url))
            .unwrap_or_default();

        let (published_at, date_estimated) = match parse_published(item.published_at.as_deref()) {
            Some(date) => (date, false),
            None => (now, true),
        };

        let key = if title.is_empty() {
            dedup_key(&link)
        } else {
            dedup_key(&title)
        };

        NormalizedNewsItem {
            source_name: source.name.clone(),
            title,
            summary,
            link,
            image_url,
            category: source.category.clone(),
            published_at,
            dedup_key: key,
            date_estimated,
        }
    }

    /// Run the page-scraping fallback for an item without a feed image, then
    /// apply the placeholder if nothing was found.
    pub async fn complete_image(&self, item: &mut NormalizedNewsItem, resolver: &dyn ImageResolver) {
        if !item.image_url.is_empty() {
            return;
        }

        let scraped = resolver.resolve(&item.link).await;
        item.image_url = absolutize_image(&scraped, &item.link)
            .unwrap_or_else(|| self.default_image_url.clone());
    }

    /// Full normalization, including the expensive network fallback.
    pub async fn normalize(
        &self,
        item: &RawFeedItem,
        source: &FeedSource,
        now: DateTime<Utc>,
        resolver: &dyn ImageResolver,
    ) -> NormalizedNewsItem {
        let mut normalized = self.normalize_offline(item, source, now);
        self.complete_image(&mut normalized, resolver).await;
        normalized
    }
}

fn text_fields(item: &RawFeedItem) -> impl Iterator<Item = &str> {
    [
        item.content_encoded.as_deref(),
        item.raw_content.as_deref(),
        item.html_summary.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|text| !text.trim().is_empty())
}

fn richest_text(item: &RawFeedItem) -> Option<&str> {
    text_fields(item).next()
}

/// Feed-embedded image, by precedence.
fn feed_image(item: &RawFeedItem) -> Option<String> {
    let declared = [
        item.media_content_urls.first().map(String::as_str),
        item.media_thumbnail_url.as_deref(),
        item.enclosure_url.as_deref(),
        item.image_url.as_deref(),
    ];

    if let Some(url) = declared
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
    {
        return Some(url.to_string());
    }

    text_fields(item)
        .find_map(embedded_image)
        .or_else(|| text_fields(item).find_map(bare_image_url))
}
