use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::aggregator::NormalizedNewsItem;

/// Domains whose feeds are verified as `high` reputation.
pub const TRUSTED_DOMAINS: &[&str] = &[
    "radiookapi.net",
    "foot.cd",
    "lequipe.fr",
    "leopardsfoot.com",
    "news.google.com",
];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AggregateNewsResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<NormalizedNewsItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VerifySourceRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl VerifySourceRequest {
    /// The feed URL to probe, or the message for a 400.
    pub fn validate(&self) -> Result<Url, String> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| "URL is required".to_string())?;

        let url = Url::parse(raw).map_err(|_| "Invalid URL".to_string())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err("Invalid URL".to_string());
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Reputation {
    High,
    Medium,
    Low,
}

pub fn is_trusted_domain(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    TRUSTED_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifySourceResponse {
    pub success: bool,
    pub verified: bool,
    pub domain: String,
    pub reputation: Reputation,
    pub ssl_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
