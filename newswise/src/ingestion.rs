use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::model::NewsResponse;

/// Source of raw headlines.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn top_headlines(&self, sources: &str) -> Result<NewsResponse>;
}

/// Client for a NewsAPI-style top-headlines endpoint (`GET ?apiKey=..&sources=..`).
pub struct NewsApiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl NewsApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("NewsWise/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsApiClient {
    async fn top_headlines(&self, sources: &str) -> Result<NewsResponse> {
        debug!(sources, "fetching top headlines");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("apiKey", self.api_key.as_str()), ("sources", sources)])
            .send()
            .await
            .context("failed to fetch headlines")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("headline fetch failed with status {}: {}", status, body));
        }

        let news: NewsResponse = response
            .json()
            .await
            .context("failed to parse headline response")?;

        info!(sources, articles = news.articles.len(), "fetched headlines");
        Ok(news)
    }
}
