//! List site content

use anyhow::{bail, Result};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ContentSource;
use crate::content::{LinkGraph, Post};
use crate::helpers::format_date;

/// List content from the source by type. Dates are shown in `tz`.
pub async fn run(source: Arc<dyn ContentSource>, content_type: &str, tz: Tz) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = source.list_posts().await?;
            println!("Posts ({}):", posts.len());
            for post in &posts {
                println!("{}", post_line(post, tz));
            }
        }
        "category" | "categories" => {
            let (categories, posts) =
                tokio::try_join!(source.list_categories(), source.list_posts())?;

            let mut counts: HashMap<&str, usize> = HashMap::new();
            for post in &posts {
                if let Some(id) = post.category_id() {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }

            if let Err(e) = LinkGraph::new(&categories).validate(&posts) {
                tracing::warn!("{}", e);
            }

            println!("Categories ({}):", categories.len());
            for category in &categories {
                println!(
                    "  {} ({}) [{}]",
                    category.name,
                    counts.get(category.id.as_str()).copied().unwrap_or(0),
                    category.id
                );
            }
        }
        other => bail!("Unknown content type: {} (expected post or category)", other),
    }

    Ok(())
}

fn post_line(post: &Post, tz: Tz) -> String {
    let date = post
        .published_at
        .as_ref()
        .map(|d| format_date(d, tz))
        .unwrap_or_else(|| "----------".to_string());
    format!("  {} - {} [{}]", date, post.title, post.id)
}
