//! Content client - read-only access to the headless CMS
//!
//! Generators only see the [`ContentSource`] trait. [`CmsClient`] talks to
//! the remote API over HTTPS; [`MemorySource`] serves a local snapshot (a
//! JSON fixture, or test data).
//!
//! Neither implementation retries, backs off or caches. Regeneration and
//! error recovery belong to the caller.

mod cms;
mod memory;

pub use cms::CmsClient;
pub use memory::MemorySource;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::content::{Category, Post};

/// Content type endpoints exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Blogs,
    Categories,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Blogs => "blogs",
            Endpoint::Categories => "categories",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field equality filter, `field[equals]value` on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn equals(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Value of the `filters` query parameter
    pub fn to_query(&self) -> String {
        format!("{}[equals]{}", self.field, self.value)
    }
}

/// Errors raised by a content source
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("request to {endpoint} was rejected ({status}), check the API key")]
    Unauthorized { endpoint: String, status: u16 },

    #[error("{endpoint} not found")]
    NotFound { endpoint: String },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

/// Read-only access to posts and categories
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// All posts, in source order
    async fn list_posts(&self) -> Result<Vec<Post>, ClientError>;

    /// All categories, in source order
    async fn list_categories(&self) -> Result<Vec<Category>, ClientError>;

    /// A single post by id
    async fn get_post(&self, id: &str) -> Result<Post, ClientError>;

    /// Posts matching an equality filter, in source order
    async fn list_posts_filtered(&self, filter: &Filter) -> Result<Vec<Post>, ClientError>;
}
