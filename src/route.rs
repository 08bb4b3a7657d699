//! Route surface of the site

use std::fmt;
use std::path::PathBuf;

use crate::helpers::{decode_segment, encode_segment};

/// A page the site can render
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    About,
    Category(String),
    Post(String),
    Feed,
    /// The 404 page
    NotFound,
}

impl Route {
    /// URL path of the route
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::About => "/about".to_string(),
            Route::Category(id) => format!("/category/{}", encode_segment(id)),
            Route::Post(id) => format!("/post/{}", encode_segment(id)),
            Route::Feed => "/rss.xml".to_string(),
            Route::NotFound => "/404.html".to_string(),
        }
    }

    /// File the route is written to, relative to the public directory
    pub fn output_path(&self) -> PathBuf {
        match self {
            Route::Home => PathBuf::from("index.html"),
            Route::About => PathBuf::from("about/index.html"),
            Route::Category(id) => PathBuf::from("category")
                .join(file_segment(id))
                .join("index.html"),
            Route::Post(id) => PathBuf::from("post").join(file_segment(id)).join("index.html"),
            Route::Feed => PathBuf::from("rss.xml"),
            Route::NotFound => PathBuf::from("404.html"),
        }
    }

    /// Parse a request path. Trailing slashes and a trailing `index.html`
    /// segment are accepted. Never yields [`Route::NotFound`].
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            [""] | ["index.html"] => Route::Home,
            ["about"] | ["about", "index.html"] => Route::About,
            ["rss.xml"] => Route::Feed,
            ["category", id] | ["category", id, "index.html"] => {
                Route::Category(decode_id(id)?)
            }
            ["post", id] | ["post", id, "index.html"] => Route::Post(decode_id(id)?),
            _ => return None,
        };
        Some(route)
    }

    /// Whether the route is served as XML rather than HTML
    pub fn is_feed(&self) -> bool {
        matches!(self, Route::Feed)
    }
}

fn decode_id(segment: &str) -> Option<String> {
    decode_segment(segment).filter(|id| !id.is_empty() && id != "." && id != "..")
}

/// Directory name for an id; dot-only names would escape the directory
fn file_segment(id: &str) -> String {
    if id.chars().all(|c| c == '.') {
        id.replace('.', "%2E")
    } else {
        encode_segment(id)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
