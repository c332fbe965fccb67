use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    services::ImageSearch,
};

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

/// Google Custom Search restricted to JPEG image results.
pub struct GoogleImageSearch {
    api_key: String,
    engine_id: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GoogleImageSearch {
    /// Credentials from `GOOGLE_API_KEY` and `GOOGLE_CSE_ID`.
    pub fn new(client: reqwest::Client) -> Result<Self> {
        Ok(Self::with_credentials(
            required_env("GOOGLE_API_KEY")?,
            required_env("GOOGLE_CSE_ID")?,
            client,
        ))
    }

    pub fn with_credentials(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: SEARCH_URL.to_string(),
            client,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn search(&self, query: &str, offset: u32, page_size: u32) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("fileType", "jpg"),
            ])
            .query(&[("start", offset), ("num", page_size)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SearchFailed {
                query: query.to_string(),
                offset,
                reason: format!("{status}: {body}"),
            });
        }

        let page: SearchResponse = response.json().await?;
        Ok(page.items.into_iter().map(|item| item.link).collect())
    }
}

fn required_env(env_var: &str) -> Result<String> {
    std::env::var(env_var).map_err(|_| Error::MissingApiKey {
        env_var: env_var.to_string(),
    })
}
