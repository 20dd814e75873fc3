pub mod client;
pub mod errors;
pub mod parser;
pub mod pipeline;
pub mod types;

pub use client::{BROWSER_USER_AGENT, FeedFetcher, HttpSettings, SourceFetcher};
pub use errors::{FeedError, FeedErrorKind};
pub use parser::parse_feed;
pub use types::{FeedSource, ParsedFeed, RawFeedItem};
