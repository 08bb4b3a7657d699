//! HTTP client for the microCMS content API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::{ClientError, ContentSource, Endpoint, Filter};
use crate::config::CmsConfig;
use crate::content::{Category, ListResponse, Post};
use crate::helpers::encode_segment;

/// Header carrying the per-deployment API key
const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

/// Largest page the API will return
const MAX_PAGE_LIMIT: usize = 100;

/// Remote content API client
///
/// Build one per process and share it; it holds a connection pool.
#[derive(Debug, Clone)]
pub struct CmsClient {
    client: reqwest::Client,
    base_url: String,
    page_limit: usize,
}

impl CmsClient {
    /// Create a new client for the configured service
    pub fn new(config: &CmsConfig, api_key: &str) -> Result<Self, ClientError> {
        if api_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig("API key is empty".to_string()));
        }

        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| ClientError::InvalidConfig(format!("API key: {}", e)))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            page_limit: config.page_limit.clamp(1, MAX_PAGE_LIMIT),
        })
    }

    /// Fetch a whole collection, following `offset` until `totalCount` items
    /// have been read. Pages are concatenated in source order.
    pub async fn list<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        filter: Option<&Filter>,
    ) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page: ListResponse<T> = self.fetch_page(endpoint, filter, offset).await?;
            let received = page.contents.len();
            items.extend(page.contents);
            offset += received;

            if received == 0 || offset >= page.total_count {
                break;
            }
        }

        tracing::debug!("Fetched {} items from {}", items.len(), endpoint);
        Ok(items)
    }

    /// Fetch a single entity by id
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        id: &str,
    ) -> Result<T, ClientError> {
        let url = format!("{}/{}/{}", self.base_url, endpoint, encode_segment(id));
        tracing::debug!("GET {}", url);
        let label = format!("{}/{}", endpoint, id);
        self.send(&label, self.client.get(&url)).await
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        filter: Option<&Filter>,
        offset: usize,
    ) -> Result<ListResponse<T>, ClientError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query = vec![
            ("limit", self.page_limit.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(filter) = filter {
            query.push(("filters", filter.to_query()));
        }

        tracing::debug!("GET {} (offset {})", url, offset);
        self.send(endpoint.as_str(), self.client.get(&url).query(&query))
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let network = |e: reqwest::Error| ClientError::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        };

        let response = request.send().await.map_err(network)?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ClientError::Unauthorized {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                endpoint: endpoint.to_string(),
            });
        }

        let body = response.text().await.map_err(network)?;
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ContentSource for CmsClient {
    async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        self.list(Endpoint::Blogs, None).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.list(Endpoint::Categories, None).await
    }

    async fn get_post(&self, id: &str) -> Result<Post, ClientError> {
        self.get(Endpoint::Blogs, id).await
    }

    async fn list_posts_filtered(&self, filter: &Filter) -> Result<Vec<Post>, ClientError> {
        self.list(Endpoint::Blogs, Some(filter)).await
    }
}
