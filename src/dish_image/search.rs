//! Google Custom Search による料理画像検索
//!
//! - APIキーはログに出力しない
//! - 失敗はすべて `None`（画像なし）に落とす

use super::{DishImage, DishImageResolver};
use crate::analyzer::wire::build_http_client;
use crate::config::{non_empty, Config, Credential, DishImageStrategy};
use crate::logging::redact_query_value;
use async_trait::async_trait;
use menu_lens_common::{build_search_query, Dish};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

pub struct GoogleImageSearch {
    api_key: Credential,
    engine_id: Option<String>,
    establishment: Option<String>,
    http: reqwest::Client,
    api_base: String,
}

impl GoogleImageSearch {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: Credential::from_option(&config.search_api_key),
            engine_id: non_empty(&config.search_engine_id).map(str::to_string),
            establishment: non_empty(&config.establishment).map(str::to_string),
            http: build_http_client(config.timeout_seconds),
            api_base: config.search_api_base.clone(),
        }
    }

    fn build_url(&self, query: &str, api_key: &str, engine_id: &str) -> Option<reqwest::Url> {
        let base = format!("{}/customsearch/v1", self.api_base.trim_end_matches('/'));
        reqwest::Url::parse_with_params(
            &base,
            &[
                ("q", query),
                ("cx", engine_id),
                ("key", api_key),
                ("searchType", "image"),
                ("num", "1"),
            ],
        )
        .map_err(|e| log::error!("Invalid search API base {}: {}", self.api_base, e))
        .ok()
    }

    /// 1件だけ画像を検索し、最初のリンクを返す
    pub async fn search_image(&self, query: &str) -> Option<String> {
        let (Some(api_key), Some(engine_id)) = (self.api_key.key(), self.engine_id.as_deref()) else {
            log::warn!("Image search credentials are not configured");
            return None;
        };

        let url = self.build_url(query, api_key, engine_id)?;
        log::debug!("Image search: {}", redact_query_value(url.as_str(), "key"));

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                // reqwest のエラー表示にはURL（キー付き）が含まれる
                log::error!("Image search request failed: {}", e.without_url());
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::error!("Image search error (status {})", status);
            return None;
        }

        let body: SearchResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                log::error!("Failed to parse image search response: {}", e.without_url());
                return None;
            }
        };

        let link = body
            .items
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|item| item.link);

        if link.is_none() {
            log::info!("No image found (query length: {} chars)", query.len());
        }
        link
    }
}

#[async_trait]
impl DishImageResolver for GoogleImageSearch {
    fn strategy(&self) -> DishImageStrategy {
        DishImageStrategy::Search
    }

    async fn resolve(&self, dish: &Dish) -> DishImage {
        let query = build_search_query(dish, self.establishment.as_deref());
        match self.search_image(&query).await {
            Some(link) => DishImage::Link(link),
            None => DishImage::Unavailable,
        }
    }
}
