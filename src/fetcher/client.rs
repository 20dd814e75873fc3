use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::fetcher::{
    errors::FeedError,
    parser::parse_feed,
    pipeline::decode_body,
    types::{FeedSource, ParsedFeed, RawFeedItem},
};

/// Several publishers reject non-browser clients outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const FEED_ACCEPT: &str = "application/rss+xml, application/xml;q=0.9, */*;q=0.8";
pub const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const MAX_FEED_BYTES: u64 = 5 * 1024 * 1024; // 5MB

/// Transport settings for one kind of outbound request.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    /// Whole-request budget, body included.
    pub timeout: Duration,
    pub user_agent: String,
    pub accept: &'static str,
    pub max_body_bytes: u64,
}

impl HttpSettings {
    pub fn for_feeds(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout.min(Duration::from_secs(5)),
            timeout,
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: FEED_ACCEPT,
            max_body_bytes: MAX_FEED_BYTES,
        }
    }

    pub fn for_pages(timeout: Duration, max_body_bytes: u64) -> Self {
        Self {
            connect_timeout: timeout.min(Duration::from_secs(5)),
            timeout,
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: HTML_ACCEPT,
            max_body_bytes,
        }
    }

    pub fn build_client(&self) -> Result<Client, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(self.accept));

        ClientBuilder::new()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers(headers)
            .build()
    }
}

/// Anything that can turn a configured source into raw items.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, FeedError>;
}

#[derive(Clone)]
pub struct FeedFetcher {
    client: Client,
    max_body_bytes: u64,
}

impl FeedFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self, FeedError> {
        let client = settings
            .build_client()
            .map_err(|e| FeedError::Network(e.to_string()))?;
        Ok(Self {
            client,
            max_body_bytes: settings.max_body_bytes,
        })
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_url(&self, url: &str) -> Result<ParsedFeed, FeedError> {
        let parsed_url = url::Url::parse(url)?;

        let mut response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(FeedError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http { status });
        }

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > self.max_body_bytes
        {
            return Err(FeedError::BodyTooLarge(content_length));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);

        // Content-Length is absent for compressed or chunked bodies, so the cap
        // is enforced while streaming as well.
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FeedError::from_reqwest_error)?
        {
            let total = (body.len() + chunk.len()) as u64;
            if total > self.max_body_bytes {
                return Err(FeedError::BodyTooLarge(total));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), "feed body received");

        let text = decode_body(content_type.as_deref(), &body);
        parse_feed(&text)
    }
}

#[async_trait]
impl SourceFetcher for FeedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, FeedError> {
        Ok(self.fetch_url(&source.url).await?.items)
    }
}
