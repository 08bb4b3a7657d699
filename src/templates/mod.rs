//! Built-in blog templates using the Tera template engine
//!
//! Templates are embedded in the binary. Every page extends `layout.html`,
//! which carries the sidebar shell (navigation, category list, social links).

use anyhow::Result;
use chrono_tz::Tz;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Category, Post};
use crate::generator::{AboutProps, CategoryProps, ContentStatus, FeedProps, HomeProps, PostProps};
use crate::helpers::{date_rfc2822, escape_xml, format_date, full_url_for, sanitize_html};
use crate::route::Route;

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
    tz: Tz,
    about_html: String,
    config: SiteConfig,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("category.html", include_str!("blog/category.html")),
            ("post.html", include_str!("blog/post.html")),
            ("about.html", include_str!("blog/about.html")),
            ("404.html", include_str!("blog/404.html")),
        ])?;

        Ok(Self {
            tera,
            site: SiteData::from(config),
            tz: config.tz(),
            about_html: render_markdown(&config.about),
            config: config.clone(),
        })
    }

    pub fn render_home(&self, props: &HomeProps) -> Result<String> {
        let mut context = self.create_base_context(&props.categories);
        context.insert("posts", &self.summaries(&props.posts));
        context.insert("unavailable", &(props.status == ContentStatus::Unavailable));
        self.render("index.html", &context)
    }

    pub fn render_about(&self, props: &AboutProps) -> Result<String> {
        let mut context = self.create_base_context(&props.categories);
        context.insert("about", &self.about_html);
        self.render("about.html", &context)
    }

    pub fn render_category(&self, props: &CategoryProps) -> Result<String> {
        let mut context = self.create_base_context(&props.categories);
        context.insert("category", &CategoryLink::from(&props.category));
        context.insert("posts", &self.summaries(&props.posts));
        self.render("category.html", &context)
    }

    pub fn render_post(&self, props: &PostProps) -> Result<String> {
        let mut context = self.create_base_context(&props.categories);
        let post = PostView {
            title: props.post.title.clone(),
            date: self.date(&props.post),
            body: sanitize_html(&props.post.content),
            category: props.category.as_ref().map(CategoryLink::from),
        };
        context.insert("post", &post);
        self.render("post.html", &context)
    }

    pub fn render_not_found(&self, categories: &[Category]) -> Result<String> {
        let context = self.create_base_context(categories);
        self.render("404.html", &context)
    }

    /// RSS 2.0 document for the feed route
    pub fn render_feed(&self, props: &FeedProps) -> String {
        let config = &self.config;
        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#);
        feed.push_str("\n<channel>\n");
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link>{}</link>\n",
            escape_xml(&full_url_for(config, "/"))
        ));
        feed.push_str(&format!(
            "  <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
            escape_xml(&full_url_for(config, &Route::Feed.path()))
        ));
        feed.push_str(&format!(
            "  <description>{}</description>\n",
            escape_xml(&config.description)
        ));

        for post in &props.posts {
            let link = full_url_for(config, &Route::Post(post.id.clone()).path());
            feed.push_str("  <item>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link>{}</link>\n", escape_xml(&link)));
            feed.push_str(&format!("    <guid>{}</guid>\n", escape_xml(&link)));
            if let Some(published) = &post.published_at {
                feed.push_str(&format!(
                    "    <pubDate>{}</pubDate>\n",
                    date_rfc2822(published)
                ));
            }
            feed.push_str(&format!(
                "    <description>{}</description>\n",
                escape_xml(&sanitize_html(&post.content))
            ));
            feed.push_str("  </item>\n");
        }

        feed.push_str("</channel>\n</rss>\n");
        feed
    }

    /// Create a base context with the layout variables
    fn create_base_context(&self, categories: &[Category]) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        let links: Vec<CategoryLink> = categories.iter().map(CategoryLink::from).collect();
        context.insert("categories", &links);
        context
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    fn summaries(&self, posts: &[Post]) -> Vec<PostSummary> {
        posts
            .iter()
            .map(|p| PostSummary {
                title: p.title.clone(),
                date: self.date(p),
                path: Route::Post(p.id.clone()).path(),
            })
            .collect()
    }

    fn date(&self, post: &Post) -> String {
        post.published_at
            .as_ref()
            .map(|d| format_date(d, self.tz))
            .unwrap_or_default()
    }
}

/// Render the about text (Markdown) to sanitized HTML
fn render_markdown(source: &str) -> String {
    let options = pulldown_cmark::Options::ENABLE_TABLES
        | pulldown_cmark::Options::ENABLE_STRIKETHROUGH;
    let parser = pulldown_cmark::Parser::new_ext(source, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    sanitize_html(&html)
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub author: String,
    pub description: String,
    pub github: String,
    pub twitter: String,
}

impl From<&SiteConfig> for SiteData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            author: config.author.clone(),
            description: config.description.clone(),
            github: config.social.github.clone(),
            twitter: config.social.twitter.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryLink {
    pub name: String,
    pub path: String,
}

impl From<&Category> for CategoryLink {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            path: Route::Category(category.id.clone()).path(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub date: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub date: String,
    pub body: String,
    pub category: Option<CategoryLink>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CategoryRef;
    use chrono::{TimeZone, Utc};

    fn renderer() -> TemplateRenderer {
        let config = SiteConfig {
            about: "I write about **Rust**.".to_string(),
            url: "https://blog.example.com".to_string(),
            ..Default::default()
        };
        TemplateRenderer::new(&config).unwrap()
    }

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn post(id: &str, title: &str, content: &str) -> Post {
        Post {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()),
            category: Some(CategoryRef::Id("rust".to_string())),
        }
    }

    #[test]
    fn test_home_with_no_posts_lists_categories() {
        let html = renderer()
            .render_home(&HomeProps {
                posts: Vec::new(),
                categories: vec![category("rust", "Rust"), category("web", "Web")],
                status: ContentStatus::Loaded,
            })
            .unwrap();
        assert!(html.contains("<h3>Latest Posts</h3>"));
        assert!(!html.contains(r#"class="post-card""#));
        assert!(html.contains(r#"<a href="/category/rust">Rust</a>"#));
        assert!(html.contains(r#"<a href="/category/web">Web</a>"#));
        assert!(!html.contains("temporarily unavailable"));
    }

    #[test]
    fn test_home_distinguishes_unavailable_content() {
        let html = renderer()
            .render_home(&HomeProps {
                posts: Vec::new(),
                categories: Vec::new(),
                status: ContentStatus::Unavailable,
            })
            .unwrap();
        assert!(html.contains("temporarily unavailable"));
    }

    #[test]
    fn test_home_lists_posts() {
        let html = renderer()
            .render_home(&HomeProps {
                posts: vec![post("abc", "Hello & Goodbye", "")],
                categories: Vec::new(),
                status: ContentStatus::Loaded,
            })
            .unwrap();
        assert!(html.contains(r#"href="/post/abc""#));
        assert!(html.contains("Hello &amp; Goodbye"));
        assert!(html.contains("2024-05-01"));
    }

    #[test]
    fn test_category_page_title() {
        let html = renderer()
            .render_category(&CategoryProps {
                category: category("rust", "Rust"),
                posts: Vec::new(),
                categories: vec![category("rust", "Rust")],
            })
            .unwrap();
        assert!(html.contains("<title>Rust - Tech Blog</title>"));
        assert!(html.contains("Posts in category: Rust"));
        assert!(html.contains("No posts in this category yet."));
    }

    #[test]
    fn test_post_body_is_sanitized() {
        let html = renderer()
            .render_post(&PostProps {
                post: post("abc", "Hi", "<p>Safe</p><script>alert(1)</script>"),
                category: Some(category("rust", "Rust")),
                categories: vec![category("rust", "Rust")],
            })
            .unwrap();
        assert!(html.contains("<p>Safe</p>"));
        assert!(!html.contains("alert(1)"));
        assert!(html.contains("<title>Hi | Tech Blog</title>"));
        assert!(html.contains(r#"&middot; <a href="/category/rust">Rust</a>"#));
    }

    #[test]
    fn test_about_renders_markdown() {
        let html = renderer()
            .render_about(&AboutProps {
                categories: Vec::new(),
                status: ContentStatus::Loaded,
            })
            .unwrap();
        assert!(html.contains("<strong>Rust</strong>"));
    }

    #[test]
    fn test_not_found_page() {
        let html = renderer().render_not_found(&[]).unwrap();
        assert!(html.contains("Page not found"));
    }

    #[test]
    fn test_feed() {
        let feed = renderer().render_feed(&FeedProps {
            posts: vec![post("abc", "A <b> title", "<p>x</p>")],
        });
        assert!(feed.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(feed.contains("<title>A &lt;b&gt; title</title>"));
        assert!(feed.contains("<link>https://blog.example.com/post/abc</link>"));
        assert!(feed.contains("<pubDate>Wed, 1 May 2024 09:00:00 +0000</pubDate>"));
        assert!(feed.contains("&lt;p&gt;x&lt;/p&gt;"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let props = HomeProps {
            posts: vec![post("a", "A", ""), post("b", "B", "")],
            categories: vec![category("rust", "Rust")],
            status: ContentStatus::Loaded,
        };
        let renderer = renderer();
        assert_eq!(
            renderer.render_home(&props).unwrap(),
            renderer.render_home(&props).unwrap()
        );
    }
}
