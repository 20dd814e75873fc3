use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static XML_DECL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<\?xml\s[^>]*?encoding\s*=\s*["']([^"']+)["']"#).unwrap()
});

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

/// Decode a fetched body to UTF-8.
///
/// Feeds are frequently mislabelled, so decoding is lossy: bytes that do not
/// fit the detected encoding become U+FFFD instead of failing the source.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> String {
    let encoding = detect_encoding(content_type, body);
    let (decoded, used, had_errors) = encoding.decode(body);

    if had_errors {
        debug!(encoding = used.name(), "body contained undecodable bytes");
    }

    decoded.into_owned()
}

pub fn detect_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    // 1. Content-Type header
    if let Some(encoding) = content_type.and_then(|ct| label_from(&CHARSET_REGEX, ct)) {
        return encoding;
    }

    let head = &body[..body.len().min(4096)];
    let head_str = String::from_utf8_lossy(head);

    // 2. <?xml ... encoding="..."?>
    if let Some(encoding) = label_from(&XML_DECL_REGEX, &head_str) {
        return encoding;
    }

    // 3. <meta charset> for feeds served as HTML
    if let Some(encoding) = label_from(&META_CHARSET_REGEX, &head_str) {
        return encoding;
    }

    // 4. Heuristic detection
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, body.len() <= head.len());
    detector.guess(None, true)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().trim().to_lowercase();
    Encoding::for_label(label.as_bytes())
}
