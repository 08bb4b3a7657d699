//! Snapshot cache for incremental regeneration
//!
//! Every rendered route is kept as an immutable snapshot. Once a snapshot is
//! older than the staleness window, the next request still gets the old
//! snapshot but schedules a background refetch. Only one regeneration per
//! route runs at a time.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::route::Route;

/// A rendered page
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub body: Arc<str>,
    pub generated_at: Instant,
}

/// Result of looking a route up in the cache
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Within the staleness window
    Fresh(Arc<str>),
    /// Past the window; serve it, then regenerate
    Stale(Arc<str>),
    /// Never generated
    Missing,
}

/// Route → snapshot store shared by all request handlers
#[derive(Debug)]
pub struct SnapshotCache {
    window: Duration,
    entries: RwLock<HashMap<Route, Snapshot>>,
    in_flight: Arc<Mutex<HashSet<Route>>>,
}

impl SnapshotCache {
    /// Create an empty cache with the given staleness window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: RwLock::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn lookup(&self, route: &Route) -> Lookup {
        let entries = self.entries.read().await;
        match entries.get(route) {
            Some(snapshot) if snapshot.generated_at.elapsed() < self.window => {
                Lookup::Fresh(snapshot.body.clone())
            }
            Some(snapshot) => Lookup::Stale(snapshot.body.clone()),
            None => Lookup::Missing,
        }
    }

    /// Replace the snapshot for a route
    pub async fn store(&self, route: Route, body: String) -> Arc<str> {
        let body: Arc<str> = body.into();
        let snapshot = Snapshot {
            body: body.clone(),
            generated_at: Instant::now(),
        };
        self.entries.write().await.insert(route, snapshot);
        body
    }

    /// Drop a route, e.g. after its content was deleted upstream
    pub async fn remove(&self, route: &Route) {
        self.entries.write().await.remove(route);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Claim the right to regenerate a route.
    ///
    /// Returns `None` when a regeneration for the route is already running.
    /// The claim is released when the guard is dropped.
    pub fn begin_regeneration(&self, route: &Route) -> Option<RegenerationGuard> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(route.clone()) {
            return None;
        }
        Some(RegenerationGuard {
            route: route.clone(),
            in_flight: self.in_flight.clone(),
        })
    }

    /// Whether a regeneration for the route is running
    pub fn is_regenerating(&self, route: &Route) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(route)
    }
}

/// Exclusive claim on a route's regeneration
#[derive(Debug)]
pub struct RegenerationGuard {
    route: Route,
    in_flight: Arc<Mutex<HashSet<Route>>>,
}

impl RegenerationGuard {
    pub fn route(&self) -> &Route {
        &self.route
    }
}

impl Drop for RegenerationGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.route);
    }
}
