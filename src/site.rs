//! Site - routes, generators, templates and the snapshot cache wired together

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::cache::{Lookup, SnapshotCache};
use crate::client::ContentSource;
use crate::config::{PathPolicy, SiteConfig};
use crate::generator::{EntityKind, GenerateError, Generators, StaticPaths};
use crate::route::Route;
use crate::templates::TemplateRenderer;

/// A renderable site over one content source
pub struct Site {
    generators: Generators,
    renderer: TemplateRenderer,
    cache: SnapshotCache,
    category_paths: RwLock<Option<KnownPaths>>,
    post_paths: RwLock<Option<KnownPaths>>,
}

/// Enumerated ids of a detail route and when they were fetched
#[derive(Debug, Clone)]
struct KnownPaths {
    paths: StaticPaths,
    fetched_at: Instant,
}

impl Site {
    pub fn new(source: Arc<dyn ContentSource>, config: &SiteConfig) -> Result<Self> {
        let generators = Generators::new(source, config);
        let cache = SnapshotCache::new(generators.revalidate());
        Ok(Self {
            renderer: TemplateRenderer::new(config)?,
            generators,
            cache,
            category_paths: RwLock::new(None),
            post_paths: RwLock::new(None),
        })
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Fetch and render a route, bypassing the cache
    pub async fn generate(&self, route: &Route) -> Result<String, GenerateError> {
        let render_error = |e: anyhow::Error| GenerateError::Render {
            route: route.path(),
            message: format!("{:#}", e),
        };

        match route {
            Route::Home => {
                let props = self.generators.home().await;
                self.renderer.render_home(&props).map_err(render_error)
            }
            Route::About => {
                let props = self.generators.about().await;
                self.renderer.render_about(&props).map_err(render_error)
            }
            Route::Category(id) => {
                let props = self.generators.category_listing(id).await?;
                self.renderer.render_category(&props).map_err(render_error)
            }
            Route::Post(id) => {
                let props = self.generators.post_page(id).await?;
                self.renderer.render_post(&props).map_err(render_error)
            }
            Route::Feed => {
                let props = self.generators.feed().await?;
                Ok(self.renderer.render_feed(&props))
            }
            Route::NotFound => {
                let props = self.generators.about().await;
                self.renderer
                    .render_not_found(&props.categories)
                    .map_err(render_error)
            }
        }
    }

    /// The 404 page, cached like any other route. Falls back to an empty
    /// category list if the source is down.
    pub async fn not_found_page(self: &Arc<Self>) -> Result<Arc<str>, GenerateError> {
        self.serve(&Route::NotFound).await
    }

    /// Enumerate every statically known route and remember the detail paths
    pub async fn enumerate(&self) -> Result<Vec<Route>, GenerateError> {
        let (categories, posts) = tokio::try_join!(
            self.generators.category_paths(),
            self.generators.post_paths()
        )?;

        let mut routes = vec![Route::Home, Route::About, Route::Feed, Route::NotFound];
        routes.extend(categories.ids.iter().cloned().map(Route::Category));
        routes.extend(posts.ids.iter().cloned().map(Route::Post));

        tracing::info!(
            "Enumerated {} categories and {} posts",
            categories.ids.len(),
            posts.ids.len()
        );
        let fetched_at = Instant::now();
        *self.category_paths.write().await = Some(KnownPaths {
            paths: categories,
            fetched_at,
        });
        *self.post_paths.write().await = Some(KnownPaths {
            paths: posts,
            fetched_at,
        });
        Ok(routes)
    }

    /// Generate every enumerated route concurrently and fill the cache.
    ///
    /// Stops at the first failing route and names it in the error.
    pub async fn prerender(self: &Arc<Self>) -> Result<Vec<(Route, Arc<str>)>> {
        let routes = self
            .enumerate()
            .await
            .context("Failed to enumerate routes")?;

        let mut tasks = JoinSet::new();
        for (index, route) in routes.into_iter().enumerate() {
            let site = Arc::clone(self);
            tasks.spawn(async move {
                let result = site.regenerate(&route).await;
                (index, route, result)
            });
        }

        let mut pages = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, route, result) = joined?;
            match result {
                Ok(body) => pages.push((index, route, body)),
                Err(e) => {
                    tasks.abort_all();
                    return Err(
                        anyhow::Error::new(e).context(format!("Failed to generate {}", route))
                    );
                }
            }
        }

        pages.sort_by_key(|(index, _, _)| *index);
        Ok(pages
            .into_iter()
            .map(|(_, route, body)| (route, body))
            .collect())
    }

    /// Generate a route and store the snapshot
    pub async fn regenerate(&self, route: &Route) -> Result<Arc<str>, GenerateError> {
        let body = self.generate(route).await?;
        tracing::debug!("Generated {}", route);
        Ok(self.cache.store(route.clone(), body).await)
    }

    /// Serve a route with stale-while-revalidate semantics.
    ///
    /// A fresh snapshot is returned as is. A stale one is returned as is and
    /// a background regeneration is scheduled. A missing one is generated
    /// while the request waits, if the route's path policy allows it.
    pub async fn serve(self: &Arc<Self>, route: &Route) -> Result<Arc<str>, GenerateError> {
        match self.cache.lookup(route).await {
            Lookup::Fresh(body) => Ok(body),
            Lookup::Stale(body) => {
                self.spawn_regeneration(route.clone());
                Ok(body)
            }
            Lookup::Missing => {
                self.check_path_policy(route).await?;
                tracing::info!("Generating {} on demand", route);
                let result = self.regenerate(route).await;
                if matches!(&result, Err(e) if e.is_not_found()) {
                    self.forget(route).await;
                }
                result
            }
        }
    }

    /// Refetch a route in the background unless a refetch is already running.
    /// The previous snapshot stays in place if the refetch fails.
    fn spawn_regeneration(self: &Arc<Self>, route: Route) {
        let Some(guard) = self.cache.begin_regeneration(&route) else {
            return;
        };

        tracing::debug!("Regenerating {} in the background", guard.route());
        let site = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            match site.regenerate(&route).await {
                Ok(_) => tracing::debug!("Regenerated {}", route),
                Err(e) if e.is_not_found() => {
                    tracing::info!("{} no longer exists, dropping snapshot", route);
                    site.cache.remove(&route).await;
                    site.forget(&route).await;
                }
                Err(e) => {
                    tracing::warn!("Regeneration of {} failed, serving stale page: {}", route, e)
                }
            }
        });
    }

    /// Reject ids the source does not know about.
    ///
    /// Exhaustive routes only accept ids from the last enumeration. Blocking
    /// routes re-enumerate for an unknown id at most once per staleness
    /// window.
    async fn check_path_policy(&self, route: &Route) -> Result<(), GenerateError> {
        let (kind, id, slot) = match route {
            Route::Category(id) => (EntityKind::Category, id, &self.category_paths),
            Route::Post(id) => (EntityKind::Post, id, &self.post_paths),
            _ => return Ok(()),
        };

        let known = self.known_paths(slot, kind).await?;
        if known.contains(id) {
            return Ok(());
        }

        if known.fallback == PathPolicy::Blocking
            && self.refresh_paths(slot, kind).await?.contains(id)
        {
            return Ok(());
        }

        Err(GenerateError::NotFound {
            kind,
            id: id.clone(),
        })
    }

    /// Enumerated paths, enumerating on first use
    async fn known_paths(
        &self,
        slot: &RwLock<Option<KnownPaths>>,
        kind: EntityKind,
    ) -> Result<StaticPaths, GenerateError> {
        if let Some(known) = slot.read().await.as_ref() {
            return Ok(known.paths.clone());
        }
        self.refresh_paths(slot, kind).await
    }

    /// Re-enumerate paths unless the last enumeration is still fresh
    async fn refresh_paths(
        &self,
        slot: &RwLock<Option<KnownPaths>>,
        kind: EntityKind,
    ) -> Result<StaticPaths, GenerateError> {
        let mut slot = slot.write().await;
        if let Some(known) = slot.as_ref() {
            if known.fetched_at.elapsed() < self.cache.window() {
                return Ok(known.paths.clone());
            }
        }

        tracing::debug!("Enumerating {} paths", kind);
        let paths = match kind {
            EntityKind::Category => self.generators.category_paths().await?,
            EntityKind::Post => self.generators.post_paths().await?,
        };
        *slot = Some(KnownPaths {
            paths: paths.clone(),
            fetched_at: Instant::now(),
        });
        Ok(paths)
    }

    /// Drop an id that the source reported missing
    async fn forget(&self, route: &Route) {
        let (id, slot) = match route {
            Route::Category(id) => (id, &self.category_paths),
            Route::Post(id) => (id, &self.post_paths),
            _ => return,
        };
        if let Some(known) = slot.write().await.as_mut() {
            known.paths.ids.retain(|known_id| known_id != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Endpoint, MemorySource};
    use crate::content::{Category, CategoryRef, Post};
    use std::time::Duration;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn post(id: &str, title: &str, category: Option<&str>) -> Post {
        Post {
            id: id.to_string(),
            title: title.to_string(),
            content: "<p>body</p>".to_string(),
            published_at: None,
            category: category.map(|c| CategoryRef::Id(c.to_string())),
        }
    }

    fn sample_source() -> Arc<MemorySource> {
        Arc::new(MemorySource::new(
            vec![post("p1", "First", Some("rust")), post("p2", "Second", None)],
            vec![category("rust", "Rust"), category("web", "Web")],
        ))
    }

    fn site(source: Arc<MemorySource>, config: &SiteConfig) -> Arc<Site> {
        Arc::new(Site::new(source, config).unwrap())
    }

    /// Let the background regeneration of a route run to completion
    async fn settle(site: &Site, route: &Route) {
        for _ in 0..100 {
            if !site.cache().is_regenerating(route) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("regeneration of {} did not finish", route);
    }

    #[tokio::test]
    async fn test_prerender_covers_every_route() {
        let site = site(sample_source(), &SiteConfig::default());
        let pages = site.prerender().await.unwrap();
        let routes: Vec<_> = pages.iter().map(|(r, _)| r.path()).collect();
        assert_eq!(
            routes,
            [
                "/",
                "/about",
                "/rss.xml",
                "/404.html",
                "/category/rust",
                "/category/web",
                "/post/p1",
                "/post/p2"
            ]
        );
        assert_eq!(site.cache().len().await, 8);
    }

    #[tokio::test]
    async fn test_prerender_fails_on_dangling_reference() {
        let source = sample_source();
        source.set_posts(vec![post("p9", "Orphan", Some("gone"))]);
        let err = site(source, &SiteConfig::default())
            .prerender()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate /post/p9");
        assert!(matches!(
            err.downcast_ref::<GenerateError>(),
            Some(GenerateError::UnresolvedReference(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_serves_cached_snapshot_within_window() {
        let source = sample_source();
        let site = site(source.clone(), &SiteConfig::default());

        let first = site.serve(&Route::Home).await.unwrap();
        assert!(first.contains("First"));

        source.set_posts(vec![post("p3", "Third", None)]);
        tokio::time::advance(Duration::from_secs(30)).await;

        let second = site.serve(&Route::Home).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_snapshot_is_served_then_refreshed() {
        let source = sample_source();
        let site = site(source.clone(), &SiteConfig::default());
        let first = site.serve(&Route::Home).await.unwrap();

        source.set_posts(vec![post("p3", "Third", None)]);
        tokio::time::advance(Duration::from_secs(61)).await;

        let stale = site.serve(&Route::Home).await.unwrap();
        assert_eq!(stale, first);

        settle(&site, &Route::Home).await;
        let refreshed = site.serve(&Route::Home).await.unwrap();
        assert!(refreshed.contains("Third"));
        assert!(!refreshed.contains("First"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_regeneration_keeps_snapshot() {
        let source = sample_source();
        let site = site(source.clone(), &SiteConfig::default());
        let first = site.serve(&Route::Post("p1".to_string())).await.unwrap();

        source.set_failing(Endpoint::Blogs, true);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(site.serve(&Route::Post("p1".to_string())).await.unwrap(), first);

        settle(&site, &Route::Post("p1".to_string())).await;
        assert!(!site.cache().is_regenerating(&Route::Post("p1".to_string())));
        assert_eq!(
            site.cache().lookup(&Route::Post("p1".to_string())).await,
            Lookup::Stale(first)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_post_is_dropped_after_window() {
        let source = sample_source();
        let site = site(source.clone(), &SiteConfig::default());
        let route = Route::Post("p2".to_string());
        site.serve(&route).await.unwrap();

        source.set_posts(vec![post("p1", "First", Some("rust"))]);
        tokio::time::advance(Duration::from_secs(61)).await;
        site.serve(&route).await.unwrap();
        settle(&site, &route).await;

        assert_eq!(site.cache().lookup(&route).await, Lookup::Missing);

        // The id is forgotten, so later requests skip the source
        let before = source.request_count();
        for _ in 0..3 {
            assert!(site.serve(&route).await.unwrap_err().is_not_found());
        }
        assert_eq!(source.request_count(), before);
    }

    #[tokio::test]
    async fn test_exhaustive_posts_reject_unknown_ids() {
        let source = sample_source();
        let site = site(source.clone(), &SiteConfig::default());
        site.enumerate().await.unwrap();

        // Added upstream after enumeration
        source.set_posts(vec![
            post("p1", "First", Some("rust")),
            post("p2", "Second", None),
            post("p3", "Third", None),
        ]);

        let err = site.serve(&Route::Post("p3".to_string())).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(site.serve(&Route::Post("p1".to_string())).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_categories_generate_on_demand() {
        let source = sample_source();
        let site = site(source.clone(), &SiteConfig::default());
        site.enumerate().await.unwrap();

        source.set_categories(vec![
            category("rust", "Rust"),
            category("web", "Web"),
            category("go", "Go"),
        ]);

        // Enumeration is still fresh, so the new id is not looked up yet
        let err = site
            .serve(&Route::Category("go".to_string()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        tokio::time::advance(Duration::from_secs(61)).await;
        let body = site.serve(&Route::Category("go".to_string())).await.unwrap();
        assert!(body.contains("<title>Go - Tech Blog</title>"));

        let err = site
            .serve(&Route::Category("nope".to_string()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_ids_and_not_found_page_are_cached() {
        let source = sample_source();
        let site = site(source.clone(), &SiteConfig::default());
        site.enumerate().await.unwrap();
        let before = source.request_count();

        for n in 0..50 {
            let err = site
                .serve(&Route::Category(format!("junk{}", n)))
                .await
                .unwrap_err();
            assert!(err.is_not_found());
            let err = site
                .serve(&Route::Post(format!("junk{}", n)))
                .await
                .unwrap_err();
            assert!(err.is_not_found());
            assert!(site.not_found_page().await.unwrap().contains("Page not found"));
        }

        // Only the first 404 page render reached the source
        assert_eq!(source.request_count() - before, 1);
    }

    #[tokio::test]
    async fn test_home_falls_back_when_source_is_down() {
        let source = sample_source();
        source.set_failing(Endpoint::Blogs, true);
        let site = site(source, &SiteConfig::default());
        let body = site.serve(&Route::Home).await.unwrap();
        assert!(body.contains("temporarily unavailable"));
    }
}
