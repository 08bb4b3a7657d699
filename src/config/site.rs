//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,
    pub url: String,
    pub timezone: String,

    /// Markdown shown on the about page
    pub about: String,

    // Directory
    pub public_dir: String,

    /// Staleness window in seconds
    pub revalidate: u64,

    /// Number of posts in the RSS feed
    pub feed_limit: usize,

    #[serde(default)]
    pub social: SocialConfig,

    #[serde(default)]
    pub cms: CmsConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Tech Blog".to_string(),
            author: "atsukiwi".to_string(),
            description: "A blog about web development, React, Next.js, and TypeScript"
                .to_string(),
            url: "http://localhost:4000".to_string(),
            timezone: "UTC".to_string(),
            about: String::new(),

            public_dir: "public".to_string(),

            revalidate: 60,
            feed_limit: 20,

            social: SocialConfig::default(),
            cms: CmsConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;
        Ok(config)
    }

    /// Staleness window as a duration
    pub fn revalidate_after(&self) -> Duration {
        Duration::from_secs(self.revalidate)
    }

    /// Configured timezone, falling back to UTC when the name is unknown
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
            chrono_tz::UTC
        })
    }
}

/// Social links shown in the sidebar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub github: String,
    pub twitter: String,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            github: "atsukiwi".to_string(),
            twitter: "atsukiwi".to_string(),
        }
    }
}

/// Headless CMS connection settings
///
/// The API key is never stored here; only the name of the environment
/// variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub service_domain: String,
    /// Overrides `https://{service_domain}.microcms.io/api/v1`
    pub api_base: Option<String>,
    pub api_key_env: String,
    /// Page size used when listing a whole collection
    pub page_limit: usize,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            service_domain: "atsukiwi".to_string(),
            api_base: None,
            api_key_env: "MICROCMS_API_KEY".to_string(),
            page_limit: 100,
        }
    }
}

impl CmsConfig {
    /// Base URL of the content API, without trailing slash
    pub fn base_url(&self) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.microcms.io/api/v1", self.service_domain),
        }
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .with_context(|| format!("Environment variable {} is not set", self.api_key_env))
    }
}

/// How the route space of a detail page is enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathPolicy {
    /// Every valid id is known up front; anything else is a 404
    Exhaustive,
    /// Unknown ids are generated on first request
    Blocking,
}

/// Path enumeration policy per detail route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub category: PathPolicy,
    pub post: PathPolicy,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            category: PathPolicy::Blocking,
            post: PathPolicy::Exhaustive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Tech Blog");
        assert_eq!(config.revalidate, 60);
        assert_eq!(config.cms.api_key_env, "MICROCMS_API_KEY");
        assert_eq!(config.paths.category, PathPolicy::Blocking);
        assert_eq!(config.paths.post, PathPolicy::Exhaustive);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
revalidate: 30
timezone: Asia/Tokyo
cms:
  service_domain: example
  page_limit: 50
paths:
  post: blocking
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.revalidate_after(), Duration::from_secs(30));
        assert_eq!(config.tz(), chrono_tz::Asia::Tokyo);
        assert_eq!(config.cms.service_domain, "example");
        assert_eq!(config.cms.page_limit, 50);
        assert_eq!(config.cms.api_key_env, "MICROCMS_API_KEY");
        assert_eq!(config.paths.post, PathPolicy::Blocking);
        assert_eq!(config.paths.category, PathPolicy::Blocking);
    }

    #[test]
    fn test_base_url() {
        let mut cms = CmsConfig::default();
        assert_eq!(cms.base_url(), "https://atsukiwi.microcms.io/api/v1");
        cms.api_base = Some("http://127.0.0.1:9000/api/".to_string());
        assert_eq!(cms.base_url(), "http://127.0.0.1:9000/api");
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert_eq!(config.tz(), chrono_tz::UTC);
    }
}
