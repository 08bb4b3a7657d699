//! URL helper functions

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/post/abc/") // -> "https://example.com/post/abc/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    format!(
        "{}/{}",
        config.url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Encode an opaque id so it stays a single path segment
pub fn encode_segment(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}

/// Decode a path segment back into an id
pub fn decode_segment(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_for() {
        let config = SiteConfig {
            url: "https://example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            full_url_for(&config, "/post/abc/"),
            "https://example.com/post/abc/"
        );
        assert_eq!(full_url_for(&config, "rss.xml"), "https://example.com/rss.xml");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("abc-123_x"), "abc-123_x");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("../etc"), "..%2Fetc");
        assert_eq!(encode_segment("a&b'c"), "a%26b%27c");
        assert_eq!(encode_segment("日本"), "%E6%97%A5%E6%9C%AC");
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("a%2Fb").as_deref(), Some("a/b"));
        assert_eq!(decode_segment(&encode_segment("日本")).as_deref(), Some("日本"));
        assert_eq!(decode_segment("%FF"), None);
    }
}
