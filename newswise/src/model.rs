use serde::{Deserialize, Serialize};

/// Topic label given to articles that arrive without content.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Topic label given to articles whose enrichment failed.
pub const FAILED: &str = "Failed";

/// Headline list as returned by the news provider and, after enrichment,
/// by `/api/news/summarized-news`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ArticleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_to_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Raw text from the provider; replaced by the summary once enriched
    pub content: Option<String>,
    /// Topic label, set by enrichment
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub bias: Option<String>,
    #[serde(default)]
    pub complex_explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Article {
    /// Article content if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// User record as held by the user store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// `|`-separated preference tags
    pub interest: Option<String>,
    pub created_at: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Article>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Article>>::deserialize(deserializer)?.unwrap_or_default())
}
