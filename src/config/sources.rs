//! Feed source catalog.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

use super::ConfigError;
use crate::fetcher::FeedSource;

const BUILTIN: &[(&str, &str, &str)] = &[
    ("Radio Okapi", "https://www.radiookapi.net/rss.xml", "RDC"),
    ("FOOT.CD", "https://foot.cd/feed/", "RDC"),
    (
        "L'ÉQUIPE",
        "https://www.lequipe.fr/rss/actu_rss_Football.xml",
        "International",
    ),
    ("LEOPARDS FOOT", "https://www.leopardsfoot.com/feed/", "Léopards"),
    ("EUROSPORT", "https://www.eurosport.fr/football/rss.xml", "International"),
    (
        "MARCA",
        "https://e00-marca.uecdn.es/rss/futbol/liga-espanola.xml",
        "Espagne",
    ),
    ("FOOT MERCATO", "https://www.footmercato.net/feed", "Mercato"),
    (
        "GOOGLE NEWS LDC",
        "https://news.google.com/rss/search?q=Champions+League+Real+Madrid+Barcelona+PSG+Man+City&hl=fr&gl=FR&ceid=FR:fr",
        "LDC",
    ),
];

pub fn builtin_sources() -> Vec<FeedSource> {
    BUILTIN
        .iter()
        .map(|(name, url, category)| FeedSource::new(*name, *url, *category))
        .collect()
}

/// Read a JSON array of `{name, url, category}` from `path`.
pub fn load_sources(path: impl AsRef<Path>) -> Result<Vec<FeedSource>, ConfigError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::SourcesFile {
        path: shown.clone(),
        source,
    })?;
    let parsed: Vec<FeedSource> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::SourcesFormat {
            path: shown.clone(),
            source,
        })?;

    let sources = sanitize(parsed);
    if sources.is_empty() {
        warn!(path = %shown, "News sources file contains no usable entries");
    }
    Ok(sources)
}

/// Drop entries with a blank name or url; keep the first of each url.
pub fn sanitize(sources: Vec<FeedSource>) -> Vec<FeedSource> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .map(|s| FeedSource::new(s.name.trim(), s.url.trim(), s.category.trim()))
        .filter(|s| !s.name.is_empty() && !s.url.is_empty())
        .filter(|s| seen.insert(s.url.clone()))
        .collect()
}
