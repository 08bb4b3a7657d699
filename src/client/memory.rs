//! In-memory content source
//!
//! Serves a fixed snapshot of posts and categories with the same semantics
//! as the remote API. Used for offline builds from a JSON fixture and in
//! tests, where content can be swapped and failures injected.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{ClientError, ContentSource, Endpoint, Filter};
use crate::content::{posts_in, Category, Post};

/// Fixture file layout, keyed by endpoint name
#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    blogs: Vec<Post>,
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Debug, Default)]
struct Snapshot {
    posts: Vec<Post>,
    categories: Vec<Category>,
    failing: HashSet<Endpoint>,
}

/// Content source backed by in-process data
#[derive(Debug, Default)]
pub struct MemorySource {
    snapshot: RwLock<Snapshot>,
    requests: AtomicUsize,
}

impl MemorySource {
    pub fn new(posts: Vec<Post>, categories: Vec<Category>) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot {
                posts,
                categories,
                failing: HashSet::new(),
            }),
            requests: AtomicUsize::new(0),
        }
    }

    /// Load a fixture of the form `{ "blogs": [...], "categories": [...] }`
    pub fn from_fixture<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
        tracing::info!(
            "Loaded fixture with {} posts and {} categories",
            fixture.blogs.len(),
            fixture.categories.len()
        );
        Ok(Self::new(fixture.blogs, fixture.categories))
    }

    /// Replace the posts, as an edit in the content source would
    pub fn set_posts(&self, posts: Vec<Post>) {
        self.write().posts = posts;
    }

    /// Replace the categories
    pub fn set_categories(&self, categories: Vec<Category>) {
        self.write().categories = categories;
    }

    /// Make every request to `endpoint` fail (or succeed again)
    pub fn set_failing(&self, endpoint: Endpoint, failing: bool) {
        let mut snapshot = self.write();
        if failing {
            snapshot.failing.insert(endpoint);
        } else {
            snapshot.failing.remove(&endpoint);
        }
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Count the request and return a read guard, or the injected failure
    fn read(
        &self,
        endpoint: Endpoint,
    ) -> Result<std::sync::RwLockReadGuard<'_, Snapshot>, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        if snapshot.failing.contains(&endpoint) {
            return Err(ClientError::Network {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        Ok(self.read(Endpoint::Blogs)?.posts.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        Ok(self.read(Endpoint::Categories)?.categories.clone())
    }

    async fn get_post(&self, id: &str) -> Result<Post, ClientError> {
        self.read(Endpoint::Blogs)?
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                endpoint: format!("{}/{}", Endpoint::Blogs, id),
            })
    }

    async fn list_posts_filtered(&self, filter: &Filter) -> Result<Vec<Post>, ClientError> {
        let snapshot = self.read(Endpoint::Blogs)?;
        match filter.field.as_str() {
            "category" => Ok(posts_in(&snapshot.posts, &filter.value)
                .into_iter()
                .cloned()
                .collect()),
            "id" => Ok(snapshot
                .posts
                .iter()
                .filter(|p| p.id == filter.value)
                .cloned()
                .collect()),
            other => Err(ClientError::Status {
                endpoint: Endpoint::Blogs.to_string(),
                status: 400,
                body: format!("unknown filter field: {}", other),
            }),
        }
    }
}
