//! Tenor GIF search.

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use toaster_core::error::ProviderError;
use tracing::{debug, warn};

/// Searches Tenor's v1 API and picks one result at random.
pub struct TenorGifSearch {
    api_url: String,
    api_key: Option<String>,
    limit: u32,
    client: reqwest::Client,
}

impl TenorGifSearch {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>, limit: u32) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            limit: limit.max(1),
            client: reqwest::Client::new(),
        }
    }

    fn gif_urls(body: SearchResponse) -> Vec<String> {
        body.results
            .into_iter()
            .filter_map(|r| r.media.into_iter().next())
            .filter_map(|m| m.gif)
            .map(|g| g.url)
            .filter(|url| !url.is_empty())
            .collect()
    }

    fn pick(mut urls: Vec<String>) -> Option<String> {
        if urls.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..urls.len());
        Some(urls.swap_remove(idx))
    }
}

#[async_trait]
impl toaster_core::GifSearch for TenorGifSearch {
    async fn search(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("tenor api key".into()))?;

        debug!(query, limit = self.limit, "Searching GIFs");
        let limit = self.limit.to_string();

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("key", key),
                ("limit", limit.as_str()),
                ("media_filter", "minimal"),
                ("contentfilter", "off"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "GIF search failed");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: body,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(Self::pick(Self::gif_urls(body)))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    media: Vec<MediaFormats>,
}

#[derive(Debug, Deserialize)]
struct MediaFormats {
    gif: Option<MediaObject>,
}

#[derive(Debug, Deserialize)]
struct MediaObject {
    #[serde(default)]
    url: String,
}
