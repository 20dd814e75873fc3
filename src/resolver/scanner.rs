//! Incremental meta-tag scanner with a hard memory bound.
//!
//! The scanner is fed the page as it arrives and reports a match as soon as
//! one of the image declarations becomes visible, so the caller can drop the
//! connection without downloading the rest of the document.

use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_MAX_SCAN_BYTES: usize = 300_000;

/// Longest declaration that can still match when split across pushes.
const MAX_TAG_BYTES: usize = 4 * 1024;

/// Highest priority first.
static IMAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)<meta[^>]+property\s*=\s*["']og:image["'][^>]+content\s*=\s*["']([^"']+)["']"#,
        r#"(?i)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]+property\s*=\s*["']og:image["']"#,
        r#"(?i)<meta[^>]+name\s*=\s*["']og:image["'][^>]+content\s*=\s*["']([^"']+)["']"#,
        r#"(?i)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]+name\s*=\s*["']og:image["']"#,
        r#"(?i)<meta[^>]+name\s*=\s*["']twitter:image["'][^>]+content\s*=\s*["']([^"']+)["']"#,
        r#"(?i)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]+name\s*=\s*["']twitter:image["']"#,
        r#"(?i)<link[^>]+rel\s*=\s*["']image_src["'][^>]+href\s*=\s*["']([^"']+)["']"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Raw attribute value, entity-decoded but not yet resolved against the page URL.
    Found(String),
    NeedMore,
    /// The byte budget is spent; nothing further will be accepted.
    Exhausted,
}

#[derive(Debug)]
pub struct MetaImageScanner {
    buffer: Vec<u8>,
    max_bytes: usize,
    exhausted: bool,
    /// Bytes already scanned with no match.
    scanned: usize,
}

impl MetaImageScanner {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_bytes.min(64 * 1024)),
            max_bytes,
            exhausted: false,
            scanned: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> ScanOutcome {
        if self.exhausted {
            return ScanOutcome::Exhausted;
        }

        let room = self.max_bytes.saturating_sub(self.buffer.len());
        let accepted = chunk.len().min(room);
        self.buffer.extend_from_slice(&chunk[..accepted]);

        // Earlier bytes held no match; only a tag cut by the last push can
        // still complete, so resume one tag length back.
        let from = self.scanned.saturating_sub(MAX_TAG_BYTES);
        if let Some(found) = self.scan_from(from) {
            return ScanOutcome::Found(found);
        }
        self.scanned = self.buffer.len();

        if accepted < chunk.len() || self.buffer.len() >= self.max_bytes {
            self.exhausted = true;
            return ScanOutcome::Exhausted;
        }

        ScanOutcome::NeedMore
    }

    /// Final attempt over whatever was buffered, for end of stream.
    pub fn finish(&self) -> Option<String> {
        self.scan_from(0)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn scan_from(&self, from: usize) -> Option<String> {
        find_image_reference(&String::from_utf8_lossy(&self.buffer[from..]))
    }
}

/// First image declaration in `html`, by pattern priority.
pub fn find_image_reference(html: &str) -> Option<String> {
    IMAGE_PATTERNS.iter().find_map(|pattern| {
        let raw = pattern.captures(html)?.get(1)?.as_str().trim();
        let value = html_escape::decode_html_entities(raw).into_owned();
        (!value.is_empty()).then_some(value)
    })
}
