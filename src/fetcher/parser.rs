//! Streaming RSS 2.0 / RSS 1.0 / Atom parser.
//!
//! Only the fields the aggregator needs are captured, including the Media RSS
//! (`media:content`, `media:thumbnail`), `enclosure` and `content:encoded`
//! extensions that carry article images.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::fetcher::{
    errors::FeedError,
    types::{ParsedFeed, RawFeedItem},
};

const ROOT_ELEMENTS: &[&str] = &["rss", "rdf:RDF", "feed"];

pub fn parse_feed(xml: &str) -> Result<ParsedFeed, FeedError> {
    let mut reader = Reader::from_str(xml);

    let mut feed = ParsedFeed::default();
    let mut saw_root = false;
    let mut current: Option<RawFeedItem> = None;
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e);
                saw_root |= ROOT_ELEMENTS.contains(&name.as_str());

                if is_entry(&name) && current.is_none() {
                    current = Some(RawFeedItem::default());
                } else if let Some(item) = current.as_mut() {
                    apply_attributes(item, &name, &e);
                }

                path.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                saw_root |= ROOT_ELEMENTS.contains(&name.as_str());
                if let Some(item) = current.as_mut() {
                    apply_attributes(item, &name, &e);
                }
            }
            Event::Text(e) => text.push_str(&unescape_text(&e)),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => {
                let name = path.pop().unwrap_or_default();
                let value = std::mem::take(&mut text);
                let value = value.trim();
                let parent = path.last().map(String::as_str).unwrap_or_default();

                if is_entry(&name) {
                    if let Some(item) = current.take()
                        && (!item.title.is_empty() || !item.link.is_empty())
                    {
                        feed.items.push(item);
                    }
                } else if let Some(item) = current.as_mut() {
                    apply_item_text(item, &name, parent, value);
                } else {
                    apply_channel_text(&mut feed, &name, parent, value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root && feed.items.is_empty() {
        return Err(FeedError::Parse(
            "document is neither RSS nor Atom".to_string(),
        ));
    }

    Ok(feed)
}

fn is_entry(name: &str) -> bool {
    name == "item" || name == "entry"
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn unescape_text(e: &BytesText<'_>) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        // HTML entities such as &nbsp; are not XML; decode them leniently.
        Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(e)).into_owned(),
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn apply_attributes(item: &mut RawFeedItem, name: &str, e: &BytesStart<'_>) {
    match name {
        "enclosure" => {
            if item.enclosure_url.is_none() {
                item.enclosure_url = attribute(e, b"url");
            }
        }
        "media:content" => {
            if let Some(url) = attribute(e, b"url") {
                item.media_content_urls.push(url);
            }
        }
        "media:thumbnail" => {
            if item.media_thumbnail_url.is_none() {
                item.media_thumbnail_url = attribute(e, b"url");
            }
        }
        "itunes:image" => {
            if item.image_url.is_none() {
                item.image_url = attribute(e, b"href");
            }
        }
        // Atom links carry the target in `href`; RSS links carry it as text.
        "link" => {
            let Some(href) = attribute(e, b"href") else {
                return;
            };
            match attribute(e, b"rel").as_deref() {
                None | Some("alternate") => {
                    if item.link.is_empty() {
                        item.link = href;
                    }
                }
                Some("enclosure") => {
                    if item.enclosure_url.is_none() {
                        item.enclosure_url = Some(href);
                    }
                }
                Some(_) => {}
            }
        }
        _ => {}
    }
}

fn apply_item_text(item: &mut RawFeedItem, name: &str, parent: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let direct_child = is_entry(parent);

    match name {
        "title" if direct_child => item.title = value.to_string(),
        "link" if direct_child && item.link.is_empty() => item.link = value.to_string(),
        "guid" | "id" if direct_child => item.guid = Some(value.to_string()),
        "pubDate" | "published" | "dc:date" => item.published_at = Some(value.to_string()),
        "updated" if item.published_at.is_none() => item.published_at = Some(value.to_string()),
        "description" | "summary" => item.html_summary = Some(value.to_string()),
        "content:encoded" => item.content_encoded = Some(value.to_string()),
        "content" => item.raw_content = Some(value.to_string()),
        "image" if direct_child && item.image_url.is_none() => {
            item.image_url = Some(value.to_string())
        }
        "url" if parent == "image" && item.image_url.is_none() => {
            item.image_url = Some(value.to_string())
        }
        _ => {}
    }
}

fn apply_channel_text(feed: &mut ParsedFeed, name: &str, parent: &str, value: &str) {
    if value.is_empty() || !matches!(parent, "channel" | "feed") {
        return;
    }
    match name {
        "title" => feed.title = Some(value.to_string()),
        "lastBuildDate" | "updated" => feed.last_updated = Some(value.to_string()),
        "pubDate" if feed.last_updated.is_none() => feed.last_updated = Some(value.to_string()),
        _ => {}
    }
}
