//! Generate static files

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::client::ContentSource;
use crate::site::Site;
use crate::Blog;

/// Export every route of the site, including the 404 page, into the
/// public directory.
///
/// Fails on the first page that cannot be generated.
pub async fn run(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<usize> {
    let start = std::time::Instant::now();

    let site = Arc::new(Site::new(source, &blog.config)?);
    let pages = site.prerender().await?;

    fs::create_dir_all(&blog.public_dir)
        .with_context(|| format!("Failed to create {:?}", blog.public_dir))?;

    for (route, body) in &pages {
        write_file(&blog.public_dir.join(route.output_path()), body)?;
        tracing::debug!("Generated: {}", route);
    }

    let count = pages.len();
    tracing::info!(
        "Generated {} files in {:.2}s",
        count,
        start.elapsed().as_secs_f64()
    );
    Ok(count)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}
