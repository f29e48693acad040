//! Topic classification and summarization of article text.
//!
//! [`ContextService`] prompts an [`LlmProvider`] directly. [`RemoteContextClient`]
//! asks a separately deployed context service over HTTP. Both implement
//! [`ArticleAnalyzer`], which is what the enrichment pipeline consumes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::llm::{LlmProvider, LlmRequest};

pub const TOPIC_PROMPT: &str = "Answer in one word. Give the topic of the article from the following: [Technology, Sports, Politics, Space, Health]";

pub const SUMMARY_PROMPT: &str = "You are being fed a news article. Your job is to analyze it, extract the core content, identify biases, generate summaries and explain complex topics\n\
Answer in the following format:\n\
Title:\n\
Potential Bias:\n\
Summary of the article\n\
Explanation of complex topics (if any):\n\n";

/// Body of `POST /api/context/topic`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicReply {
    #[serde(default)]
    pub topic: Option<String>,
}

/// Body of `POST /api/context/summarize`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryReply {
    #[serde(default)]
    pub summary: Option<String>,
}

/// Topic and summary lookups for a single article text.
#[async_trait::async_trait]
pub trait ArticleAnalyzer: Send + Sync {
    async fn topic(&self, article_text: &str) -> Result<TopicReply>;
    async fn summarize(&self, article_text: &str) -> Result<SummaryReply>;
}

/// Prompt templates over an LLM provider.
pub struct ContextService {
    provider: Arc<dyn LlmProvider>,
}

impl ContextService {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Free-form prompt passthrough.
    pub async fn generate_response(&self, message: &str) -> Result<String> {
        self.complete(message.to_string()).await
    }

    pub async fn summarize_article(&self, article_text: &str) -> Result<String> {
        self.complete(format!("{}{}", SUMMARY_PROMPT, article_text)).await
    }

    /// One-word topic, returned verbatim (not checked against the topic list).
    pub async fn get_topic(&self, article_text: &str) -> Result<String> {
        self.complete(format!("{}{}", TOPIC_PROMPT, article_text)).await
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let response = self.provider.generate(LlmRequest::prompt(prompt)).await?;
        debug!(
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "llm completion received"
        );
        Ok(response.content)
    }
}

#[async_trait::async_trait]
impl ArticleAnalyzer for ContextService {
    async fn topic(&self, article_text: &str) -> Result<TopicReply> {
        Ok(TopicReply {
            topic: Some(self.get_topic(article_text).await?),
        })
    }

    async fn summarize(&self, article_text: &str) -> Result<SummaryReply> {
        Ok(SummaryReply {
            summary: Some(self.summarize_article(article_text).await?),
        })
    }
}

/// HTTP client for a remote context service.
pub struct RemoteContextClient {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteContextClient {
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

    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, article_text: &str) -> Result<T> {
        let url = format!("{}/api/context/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(article_text.to_string())
            .send()
            .await
            .with_context(|| format!("context service request failed: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("context service error {}: {}", status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("failed to parse context service response from {}", url))
    }
}

#[async_trait::async_trait]
impl ArticleAnalyzer for RemoteContextClient {
    async fn topic(&self, article_text: &str) -> Result<TopicReply> {
        self.post("topic", article_text).await
    }

    async fn summarize(&self, article_text: &str) -> Result<SummaryReply> {
        self.post("summarize", article_text).await
    }
}
