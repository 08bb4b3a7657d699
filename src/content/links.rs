//! Post ↔ category link derivation

use std::collections::HashMap;
use thiserror::Error;

use super::{Category, Post};

/// A post points at a category id that is not in the category collection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("post {post_id} references unknown category {category_id}")]
pub struct UnresolvedReference {
    pub post_id: String,
    pub category_id: String,
}

/// Index of categories by id, used to resolve post references
pub struct LinkGraph<'a> {
    categories: &'a [Category],
    by_id: HashMap<&'a str, usize>,
}

impl<'a> LinkGraph<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        let mut by_id = HashMap::with_capacity(categories.len());
        for (i, category) in categories.iter().enumerate() {
            // first occurrence wins
            by_id.entry(category.id.as_str()).or_insert(i);
        }
        Self { categories, by_id }
    }

    /// Look up a category by exact id
    pub fn category(&self, id: &str) -> Option<&'a Category> {
        self.by_id.get(id).map(|&i| &self.categories[i])
    }

    /// Resolve the category a post belongs to.
    ///
    /// `Ok(None)` means the post has no category; a reference that cannot be
    /// resolved is an error.
    pub fn resolve(&self, post: &Post) -> Result<Option<&'a Category>, UnresolvedReference> {
        match post.category_id() {
            None => Ok(None),
            Some(id) => self.category(id).map(Some).ok_or_else(|| UnresolvedReference {
                post_id: post.id.clone(),
                category_id: id.to_string(),
            }),
        }
    }

    /// Check every post's reference, reporting the first dangling one
    pub fn validate(&self, posts: &[Post]) -> Result<(), UnresolvedReference> {
        for post in posts {
            self.resolve(post)?;
        }
        Ok(())
    }
}

/// Posts whose category reference equals `category_id`, in source order.
///
/// Same semantics as the content API's `category[equals]` filter.
pub fn posts_in<'p>(posts: &'p [Post], category_id: &str) -> Vec<&'p Post> {
    posts
        .iter()
        .filter(|p| p.category_id() == Some(category_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CategoryRef;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn post(id: &str, category: Option<&str>) -> Post {
        Post {
            id: id.to_string(),
            title: format!("Post {}", id),
            content: String::new(),
            published_at: None,
            category: category.map(|c| CategoryRef::Id(c.to_string())),
        }
    }

    #[test]
    fn test_resolve() {
        let categories = vec![category("rust", "Rust"), category("web", "Web")];
        let graph = LinkGraph::new(&categories);

        assert_eq!(graph.resolve(&post("1", Some("web"))).unwrap().unwrap().name, "Web");
        assert_eq!(graph.resolve(&post("2", None)).unwrap(), None);
        assert_eq!(
            graph.resolve(&post("3", Some("go"))).unwrap_err(),
            UnresolvedReference {
                post_id: "3".to_string(),
                category_id: "go".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_is_exact_match() {
        let categories = vec![category("rust", "Rust")];
        let graph = LinkGraph::new(&categories);
        assert!(graph.category("Rust").is_none());
        assert!(graph.category("rus").is_none());
        assert!(graph.category("rust ").is_none());
    }

    #[test]
    fn test_validate_reports_first_dangling() {
        let categories = vec![category("rust", "Rust")];
        let graph = LinkGraph::new(&categories);
        let posts = vec![post("1", Some("rust")), post("2", Some("a")), post("3", Some("b"))];
        assert_eq!(graph.validate(&posts).unwrap_err().post_id, "2");
        assert!(graph.validate(&posts[..1]).is_ok());
    }

    #[test]
    fn test_posts_in_keeps_source_order() {
        let posts = vec![
            post("3", Some("rust")),
            post("1", Some("web")),
            post("2", Some("rust")),
            post("4", None),
        ];
        let ids: Vec<_> = posts_in(&posts, "rust").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["3", "2"]);
        assert!(posts_in(&posts, "go").is_empty());
    }
}
