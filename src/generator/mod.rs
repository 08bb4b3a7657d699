//! Page generators - fetch the data each route needs
//!
//! Generators never render; they return props for the templates. Each one
//! runs to completion against the content source (no partial results).
//! Listing pages degrade to empty collections on fetch failure; detail pages
//! and the feed surface the failure.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::client::{ClientError, ContentSource, Filter};
use crate::config::{PathPolicy, SiteConfig};
use crate::content::{Category, LinkGraph, Post, UnresolvedReference};

/// Kind of entity a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Post,
    Category,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Post => f.write_str("post"),
            EntityKind::Category => f.write_str("category"),
        }
    }
}

/// Errors raised while generating a page
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Fetch(#[from] ClientError),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error(transparent)]
    UnresolvedReference(#[from] UnresolvedReference),

    #[error("failed to render {route}: {message}")]
    Render { route: String, message: String },
}

impl GenerateError {
    /// Whether the page simply does not exist (a 404 rather than a 500)
    pub fn is_not_found(&self) -> bool {
        match self {
            GenerateError::NotFound { .. } => true,
            GenerateError::Fetch(e) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;

/// Whether listing content was actually fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    Loaded,
    /// The source failed; collections are empty as a fallback
    Unavailable,
}

/// Props for the home page
#[derive(Debug, Clone, PartialEq)]
pub struct HomeProps {
    pub posts: Vec<Post>,
    pub categories: Vec<Category>,
    pub status: ContentStatus,
}

impl HomeProps {
    fn unavailable() -> Self {
        Self {
            posts: Vec::new(),
            categories: Vec::new(),
            status: ContentStatus::Unavailable,
        }
    }
}

/// Props for the about page
#[derive(Debug, Clone, PartialEq)]
pub struct AboutProps {
    pub categories: Vec<Category>,
    pub status: ContentStatus,
}

/// Posts of one category, with the category resolved
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProps {
    pub category: Category,
    pub posts: Vec<Post>,
    pub categories: Vec<Category>,
}

/// A single post with its resolved category
#[derive(Debug, Clone, PartialEq)]
pub struct PostProps {
    pub post: Post,
    pub category: Option<Category>,
    pub categories: Vec<Category>,
}

/// Props for the RSS feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedProps {
    pub posts: Vec<Post>,
}

/// Result of path enumeration for a detail route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    /// Ids known at enumeration time, in source order
    pub ids: Vec<String>,
    /// What to do with ids outside `ids`
    pub fallback: PathPolicy,
}

impl StaticPaths {
    /// Whether `id` was known at enumeration time
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }
}

/// Per-route generators over an injected content source
#[derive(Clone)]
pub struct Generators {
    source: Arc<dyn ContentSource>,
    category_paths: PathPolicy,
    post_paths: PathPolicy,
    feed_limit: usize,
    revalidate: Duration,
}

impl Generators {
    pub fn new(source: Arc<dyn ContentSource>, config: &SiteConfig) -> Self {
        Self {
            source,
            category_paths: config.paths.category,
            post_paths: config.paths.post,
            feed_limit: config.feed_limit,
            revalidate: config.revalidate_after(),
        }
    }

    /// Staleness window declared for every generated page
    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    /// All posts and categories. Falls back to empty collections when either
    /// fetch fails.
    pub async fn home(&self) -> HomeProps {
        tracing::debug!("Fetching posts and categories for home page");
        let fetched = tokio::try_join!(self.source.list_posts(), self.source.list_categories());
        match fetched {
            Ok((posts, categories)) => HomeProps {
                posts,
                categories,
                status: ContentStatus::Loaded,
            },
            Err(e) => {
                tracing::error!("Failed to fetch home page content: {}", e);
                HomeProps::unavailable()
            }
        }
    }

    /// Categories for the navigation shell, with the same fallback as `home`
    pub async fn about(&self) -> AboutProps {
        match self.source.list_categories().await {
            Ok(categories) => AboutProps {
                categories,
                status: ContentStatus::Loaded,
            },
            Err(e) => {
                tracing::error!("Failed to fetch categories for about page: {}", e);
                AboutProps {
                    categories: Vec::new(),
                    status: ContentStatus::Unavailable,
                }
            }
        }
    }

    /// Enumerate every category route
    pub async fn category_paths(&self) -> Result<StaticPaths> {
        let categories = self.source.list_categories().await?;
        Ok(StaticPaths {
            ids: categories.into_iter().map(|c| c.id).collect(),
            fallback: self.category_paths,
        })
    }

    /// Fetch categories and the posts filtered to `id`, then resolve the
    /// category by exact id.
    pub async fn category_listing(&self, id: &str) -> Result<CategoryProps> {
        let filter = Filter::equals("category", id);
        let (categories, posts) = tokio::try_join!(
            self.source.list_categories(),
            self.source.list_posts_filtered(&filter)
        )?;

        let category = LinkGraph::new(&categories)
            .category(id)
            .cloned()
            .ok_or_else(|| GenerateError::NotFound {
                kind: EntityKind::Category,
                id: id.to_string(),
            })?;

        tracing::debug!("Category {} has {} posts", id, posts.len());
        Ok(CategoryProps {
            category,
            posts,
            categories,
        })
    }

    /// Enumerate every post route
    pub async fn post_paths(&self) -> Result<StaticPaths> {
        let posts = self.source.list_posts().await?;
        Ok(StaticPaths {
            ids: posts.into_iter().map(|p| p.id).collect(),
            fallback: self.post_paths,
        })
    }

    /// A single post plus the category list; the post's category reference
    /// must resolve.
    pub async fn post_page(&self, id: &str) -> Result<PostProps> {
        let (post, categories) =
            tokio::try_join!(self.source.get_post(id), self.source.list_categories())?;

        let category = LinkGraph::new(&categories).resolve(&post)?.cloned();
        Ok(PostProps {
            post,
            category,
            categories,
        })
    }

    /// Most recent posts in source order, for the RSS feed
    pub async fn feed(&self) -> Result<FeedProps> {
        let mut posts = self.source.list_posts().await?;
        posts.truncate(self.feed_limit);
        Ok(FeedProps { posts })
    }
}
