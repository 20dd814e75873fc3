use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("network failure: {0}")]
    Network(String),

    #[error("http error {status}")]
    Http { status: reqwest::StatusCode },

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("malformed feed: {0}")]
    Parse(String),
}

/// Coarse classification used for logging and reporting per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedErrorKind {
    Timeout,
    NetworkFailure,
    ParseFailure,
}

impl FeedError {
    pub fn kind(&self) -> FeedErrorKind {
        match self {
            Self::ConnectTimeout | Self::RequestTimeout => FeedErrorKind::Timeout,
            Self::InvalidUrl(_) | Self::Network(_) | Self::Http { .. } | Self::BodyTooLarge(_) => {
                FeedErrorKind::NetworkFailure
            }
            Self::Parse(_) => FeedErrorKind::ParseFailure,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if let Some(status) = err.status() {
            Self::Http { status }
        } else if err.is_decode() {
            // Undecodable gzip/brotli streams are the publisher's fault, not the network's.
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<quick_xml::Error> for FeedError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
