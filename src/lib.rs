//! cms-blog: a static blog generator backed by a headless CMS
//!
//! Posts and categories are fetched from the content API, rendered with the
//! embedded Tera theme, and either exported as static files or served with
//! incremental regeneration.

pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod route;
pub mod server;
pub mod site;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use client::{CmsClient, ContentSource, MemorySource};

/// The blog project in a directory
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Load the project in `base_dir`. A missing `_config.yml` means defaults.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
        })
    }

    /// Content source for this project: a local fixture when given,
    /// otherwise the configured CMS
    pub fn source(&self, fixture: Option<&Path>) -> Result<Arc<dyn ContentSource>> {
        match fixture {
            Some(path) => {
                let path = self.base_dir.join(path);
                tracing::info!("Using content fixture {:?}", path);
                Ok(Arc::new(MemorySource::from_fixture(&path)?))
            }
            None => {
                let api_key = self.config.cms.api_key()?;
                let client = CmsClient::new(&self.config.cms, &api_key)
                    .context("Failed to create CMS client")?;
                tracing::info!("Using content API at {}", self.config.cms.base_url());
                Ok(Arc::new(client))
            }
        }
    }

    /// Generate the static site
    pub async fn generate(&self, fixture: Option<&Path>) -> Result<usize> {
        commands::generate::run(self, self.source(fixture)?).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
