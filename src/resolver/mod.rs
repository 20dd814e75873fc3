//! Article image resolution by scraping the page head.
//!
//! Callers depend only on [`ImageResolver`]; the regex scanner behind
//! [`HttpImageResolver`] can be replaced without touching them.

pub mod scanner;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::fetcher::{FeedError, HttpSettings};
pub use scanner::{DEFAULT_MAX_SCAN_BYTES, MetaImageScanner, ScanOutcome, find_image_reference};

/// Resolves a representative image for an article page.
///
/// Never fails: an empty string means "no image found", whatever the reason.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, page_url: &str) -> String;
}

pub struct HttpImageResolver {
    client: Client,
    max_bytes: usize,
}

impl HttpImageResolver {
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: settings.build_client()?,
            max_bytes: usize::try_from(settings.max_body_bytes).unwrap_or(usize::MAX),
        })
    }

    async fn try_resolve(&self, page_url: &str) -> Result<Option<String>, FeedError> {
        let url = Url::parse(page_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Ok(None);
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FeedError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http { status });
        }

        let base = response.url().clone();
        let mut scanner = MetaImageScanner::new(self.max_bytes);

        // Returning drops `response`, which aborts the transfer and releases
        // the connection; nothing past the match or the cap is downloaded.
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FeedError::from_reqwest_error)?
        {
            match scanner.push(&chunk) {
                ScanOutcome::Found(raw) => return Ok(absolutize(&base, &raw)),
                ScanOutcome::Exhausted => {
                    debug!(bytes = scanner.buffered(), "scan budget exhausted");
                    break;
                }
                ScanOutcome::NeedMore => {}
            }
        }

        Ok(scanner.finish().and_then(|raw| absolutize(&base, &raw)))
    }
}

#[async_trait]
impl ImageResolver for HttpImageResolver {
    #[instrument(skip(self), fields(url = %page_url))]
    async fn resolve(&self, page_url: &str) -> String {
        if page_url.trim().is_empty() {
            return String::new();
        }

        match self.try_resolve(page_url.trim()).await {
            Ok(Some(image)) => {
                debug!(image = %image, "resolved article image");
                image
            }
            Ok(None) => String::new(),
            Err(e) => {
                debug!(error = %e, "image resolution failed");
                String::new()
            }
        }
    }
}

fn absolutize(base: &Url, raw: &str) -> Option<String> {
    let resolved = base.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_relative_against_page() {
        let base = Url::parse("https://foot.cd/2026/10/article").unwrap();
        assert_eq!(
            absolutize(&base, "/wp-content/a.jpg").as_deref(),
            Some("https://foot.cd/wp-content/a.jpg")
        );
        assert_eq!(
            absolutize(&base, "//cdn.foot.cd/a.jpg").as_deref(),
            Some("https://cdn.foot.cd/a.jpg")
        );
        assert_eq!(absolutize(&base, "data:image/png;base64,AAAA"), None);
    }

    #[tokio::test]
    async fn test_empty_and_non_http_urls_resolve_to_empty() {
        let settings = HttpSettings::for_pages(std::time::Duration::from_secs(1), 1024);
        let resolver = HttpImageResolver::new(&settings).unwrap();

        assert_eq!(resolver.resolve("").await, "");
        assert_eq!(resolver.resolve("   ").await, "");
        assert_eq!(resolver.resolve("ftp://example.com/page").await, "");
        assert_eq!(resolver.resolve("not a url").await, "");
    }
}
