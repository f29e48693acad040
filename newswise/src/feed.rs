use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::ingestion::NewsSource;
use crate::model::NewsResponse;
use crate::processing::EnrichmentPipeline;

/// Source of enriched (categorized and summarized) headlines.
///
/// `Ok(None)` means the service answered without a headline list.
#[async_trait::async_trait]
pub trait NewsFeed: Send + Sync {
    async fn summarized_news(&self, sources: &str) -> Result<Option<NewsResponse>>;
}

/// Fetches headlines and runs them through the enrichment pipeline.
pub struct NewsService {
    source: Arc<dyn NewsSource>,
    pipeline: EnrichmentPipeline,
}

impl NewsService {
    pub fn new(source: Arc<dyn NewsSource>, pipeline: EnrichmentPipeline) -> Self {
        Self { source, pipeline }
    }

    pub async fn categorized_and_summarized(&self, sources: &str) -> Result<NewsResponse> {
        let news = self.source.top_headlines(sources).await?;
        Ok(self.pipeline.enrich(news).await)
    }
}

#[async_trait::async_trait]
impl NewsFeed for NewsService {
    async fn summarized_news(&self, sources: &str) -> Result<Option<NewsResponse>> {
        self.categorized_and_summarized(sources).await.map(Some)
    }
}

/// Client for a remote news service's `/api/news/summarized-news`.
pub struct RemoteNewsFeed {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteNewsFeed {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("NewsWise/0.1.0")
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl NewsFeed for RemoteNewsFeed {
    async fn summarized_news(&self, sources: &str) -> Result<Option<NewsResponse>> {
        let url = format!(
            "{}/api/news/summarized-news",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .query(&[("sources", sources)])
            .send()
            .await
            .with_context(|| format!("news service request failed: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("news service error {}: {}", status, body);
        }

        // an empty or `null` body is "no news", not an error
        let body = response.text().await.context("failed to read news service body")?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body).context("failed to parse news service response")
    }
}
