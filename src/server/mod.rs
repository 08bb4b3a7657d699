//! HTTP server backed by the snapshot cache

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::route::Route;
use crate::site::Site;

/// Build the router serving every route of the site
pub fn router(site: Arc<Site>) -> Router {
    Router::new()
        .fallback(page_handler)
        .with_state(site)
        .layer(TraceLayer::new_for_http())
}

/// Warm the cache and start serving
pub async fn start(site: Arc<Site>, ip: &str, port: u16, open: bool) -> Result<()> {
    match site.prerender().await {
        Ok(pages) => tracing::info!("Prerendered {} pages", pages.len()),
        Err(e) => tracing::warn!("Prerender incomplete, pages will be generated on demand: {}", e),
    }

    let app = router(site);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn page_handler(State(site): State<Arc<Site>>, request: Request<Body>) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(route) = Route::parse(request.uri().path()) else {
        return not_found(&site).await;
    };

    match site.serve(&route).await {
        Ok(body) => page_response(&route, body, site.cache().window().as_secs()),
        Err(e) if e.is_not_found() => {
            tracing::debug!("{}: {}", route, e);
            not_found(&site).await
        }
        Err(e) => {
            tracing::error!("Failed to serve {}: {}", route, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn page_response(route: &Route, body: Arc<str>, max_age: u64) -> Response {
    let mut response = if route.is_feed() {
        (
            [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
            body.to_string(),
        )
            .into_response()
    } else {
        Html(body.to_string()).into_response()
    };

    if let Ok(value) = HeaderValue::from_str(&format!(
        "s-maxage={}, stale-while-revalidate",
        max_age
    )) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

async fn not_found(site: &Arc<Site>) -> Response {
    match site.not_found_page().await {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html.to_string())).into_response(),
        Err(e) => {
            tracing::error!("Failed to render 404 page: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
