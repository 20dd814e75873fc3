#![no_main]

use libfuzzer_sys::fuzz_target;

use kickoff::aggregator::{Normalizer, clean_title};
use kickoff::fetcher::{FeedSource, parse_feed};

fuzz_target!(|data: &[u8]| {
    // The parser and normalizer should never panic regardless of input
    let xml = String::from_utf8_lossy(data);
    let Ok(feed) = parse_feed(&xml) else {
        return;
    };

    let source = FeedSource::new("fuzz", "https://example.com/feed", "Test");
    let normalizer = Normalizer::default();
    for item in &feed.items {
        let _ = clean_title(&item.title);
        let _ = normalizer.normalize_offline(item, &source, chrono::Utc::now());
    }
});
