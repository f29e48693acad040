use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::ArticleAnalyzer;
use crate::model::{Article, NewsResponse, FAILED, UNCATEGORIZED};
use crate::sections::parse_sections;

pub const NO_CONTENT: &str = "No content available.";
pub const UNKNOWN_TOPIC: &str = "Unknown";
pub const NO_SUMMARY: &str = "No summary available";
pub const ERROR_PREFIX: &str = "Error processing article: ";

/// What happened to a single article during enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Enriched,
    Empty,
    Failed,
}

/// Attaches a topic and a summary to every article of a headline list.
///
/// Articles are handled one after another, in order. A failing article is
/// marked `"Failed"` and the rest of the list is still processed.
pub struct EnrichmentPipeline {
    analyzer: Arc<dyn ArticleAnalyzer>,
}

impl EnrichmentPipeline {
    pub fn new(analyzer: Arc<dyn ArticleAnalyzer>) -> Self {
        Self { analyzer }
    }

    pub async fn enrich(&self, mut news: NewsResponse) -> NewsResponse {
        let total = news.articles.len();
        info!("Enriching {} articles", total);

        let (mut enriched, mut empty, mut failed) = (0usize, 0usize, 0usize);
        for (index, article) in news.articles.iter_mut().enumerate() {
            match self.enrich_article(article).await {
                Outcome::Enriched => enriched += 1,
                Outcome::Empty => {
                    debug!(index, "article has no content, skipped");
                    empty += 1
                }
                Outcome::Failed => failed += 1,
            }
        }

        info!(total, enriched, empty, failed, "enrichment finished");
        news
    }

    /// Annotate one article in place.
    pub async fn enrich_article(&self, article: &mut Article) -> Outcome {
        let Some(text) = article.text().map(str::to_owned) else {
            article.category = Some(UNCATEGORIZED.to_string());
            article.content = Some(NO_CONTENT.to_string());
            return Outcome::Empty;
        };

        match self.analyze(&text).await {
            Ok((topic, summary)) => {
                let sections = parse_sections(&summary);
                article.category = Some(topic);
                article.content = Some(summary);
                article.bias = sections.bias;
                article.complex_explanation = sections.explanation;
                Outcome::Enriched
            }
            Err(e) => {
                warn!(title = ?article.title, "Failed to process article: {:#}", e);
                article.category = Some(FAILED.to_string());
                article.content = Some(format!("{}{:#}", ERROR_PREFIX, e));
                Outcome::Failed
            }
        }
    }

    // Topic first, then summary; two separate requests.
    async fn analyze(&self, text: &str) -> Result<(String, String)> {
        let topic = self
            .analyzer
            .topic(text)
            .await?
            .topic
            .unwrap_or_else(|| UNKNOWN_TOPIC.to_string());

        let summary = self
            .analyzer
            .summarize(text)
            .await?
            .summary
            .unwrap_or_else(|| NO_SUMMARY.to_string());

        Ok((topic, summary))
    }
}
