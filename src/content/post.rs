//! Post and Category models as returned by the content API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post (`blogs` endpoint)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Source-assigned identifier
    pub id: String,

    /// Post title
    pub title: String,

    /// Raw HTML body, untrusted until sanitized
    #[serde(default)]
    pub content: String,

    /// Publication date (absent on drafts)
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Reference to a category, expanded or bare
    #[serde(default)]
    pub category: Option<CategoryRef>,
}

impl Post {
    /// Id of the referenced category, if any
    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(CategoryRef::id)
    }
}

/// A category (`categories` endpoint)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A content reference field.
///
/// The API returns references expanded into the referenced object, but a
/// bare id is accepted as well. Only the id is trusted; the name is resolved
/// against the category collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Object {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) => id,
            CategoryRef::Object { id, .. } => id,
        }
    }
}

/// List envelope used by every collection endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub contents: Vec<T>,
    pub total_count: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}
