//! HTML helper functions

use std::borrow::Cow;

/// Hosts whose players may be embedded with `<iframe>`
const EMBED_HOSTS: &[&str] = &[
    "www.youtube.com",
    "www.youtube-nocookie.com",
    "player.vimeo.com",
    "codepen.io",
    "speakerdeck.com",
];

/// Sanitize a post body from the content source.
///
/// Post bodies are raw HTML written in the CMS editor. Scripts, event
/// handlers and other non-allow-listed markup are removed; formatting,
/// links, images, tables and code blocks are kept. Iframes keep their `src`
/// only for https URLs on [`EMBED_HOSTS`].
pub fn sanitize_html(html: &str) -> String {
    ammonia::Builder::default()
        .add_generic_attributes(&["id", "class"])
        .add_tags(&["figure", "figcaption", "iframe"])
        .add_tag_attributes(
            "iframe",
            &["src", "width", "height", "allowfullscreen", "frameborder"],
        )
        .url_schemes(["http", "https", "mailto"].into_iter().collect())
        .attribute_filter(|element, attribute, value| {
            if element == "iframe" && attribute == "src" && !is_embed_url(value) {
                None
            } else {
                Some(Cow::Borrowed(value))
            }
        })
        .clean(html)
        .to_string()
}

fn is_embed_url(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("https://") else {
        return false;
    };
    let host = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    EMBED_HOSTS.contains(&host.to_ascii_lowercase().as_str())
}

/// Escape text for inclusion in XML
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
