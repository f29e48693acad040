use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::feed::NewsFeed;
use crate::model::Article;
use crate::storage::UserStore;

/// Separator between tags in a user's interest string.
pub const INTEREST_DELIMITER: char = '|';

/// Split an interest string into preference tags. Empty tags are kept.
pub fn preference_tags(interest: &str) -> Vec<&str> {
    interest.split(INTEREST_DELIMITER).collect()
}

/// True when the article's category contains any of the tags (case-sensitive).
pub fn matches_any(article: &Article, tags: &[&str]) -> bool {
    article
        .category
        .as_deref()
        .map_or(false, |category| tags.iter().any(|tag| category.contains(tag)))
}

/// Keep the articles matching any tag, preserving order.
pub fn filter_articles(articles: Vec<Article>, tags: &[&str]) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|a| matches_any(a, tags))
        .collect()
}

/// Builds a per-user feed by matching interest tags against article categories.
pub struct Recommender {
    users: Arc<dyn UserStore>,
    news: Arc<dyn NewsFeed>,
    source: String,
}

impl Recommender {
    /// `source` is the news source the feed is built from, e.g. "bbc-news".
    pub fn new(users: Arc<dyn UserStore>, news: Arc<dyn NewsFeed>, source: impl Into<String>) -> Self {
        Self {
            users,
            news,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Raw interest string, `None` if the user does not exist.
    pub async fn user_preference(&self, user_id: i64) -> Result<Option<String>> {
        self.users.interest(user_id).await
    }

    /// Articles from the configured source matching the user's interests.
    pub async fn matching_articles(&self, user_id: i64) -> Result<Vec<Article>> {
        self.matching_articles_from(user_id, &self.source).await
    }

    /// Same as [`Self::matching_articles`] with an explicit news source.
    ///
    /// Unknown users, empty interests and empty headline lists all give an
    /// empty feed. Transport failures of the user store or news feed are errors.
    pub async fn matching_articles_from(&self, user_id: i64, sources: &str) -> Result<Vec<Article>> {
        let interest = match self.users.interest(user_id).await? {
            Some(i) if !i.is_empty() => i,
            _ => {
                info!(user_id, "User interest not found");
                return Ok(Vec::new());
            }
        };
        debug!(user_id, interest = %interest, "user interest");

        let articles = match self.news.summarized_news(sources).await? {
            Some(news) if !news.articles.is_empty() => news.articles,
            _ => {
                info!(sources, "No articles received from news feed");
                return Ok(Vec::new());
            }
        };

        let fetched = articles.len();
        let tags = preference_tags(&interest);
        for article in &articles {
            debug!(category = ?article.category, "article category");
        }
        let filtered = filter_articles(articles, &tags);

        info!(user_id, fetched, retained = filtered.len(), "filtered articles");
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_category(category: Option<&str>) -> Article {
        Article {
            category: category.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn splits_on_pipe() {
        assert_eq!(preference_tags("Sports|Tech"), vec!["Sports", "Tech"]);
        assert_eq!(preference_tags("Sports"), vec!["Sports"]);
    }

    #[test]
    fn empty_tags_are_preserved() {
        assert_eq!(preference_tags("Sports||Tech|"), vec!["Sports", "", "Tech", ""]);
    }

    #[test]
    fn category_must_contain_tag() {
        let tags = preference_tags("Sports|Tech");
        assert!(matches_any(&with_category(Some("Sports")), &tags));
        assert!(matches_any(&with_category(Some("TechNews")), &tags));
        assert!(!matches_any(&with_category(Some("Politics")), &tags));
        // tag containing the category does not count
        assert!(!matches_any(&with_category(Some("Te")), &tags));
        // case-sensitive
        assert!(!matches_any(&with_category(Some("sports")), &tags));
        assert!(!matches_any(&with_category(None), &tags));
    }

    #[test]
    fn filter_keeps_order() {
        let articles = vec![
            with_category(Some("Technology")),
            with_category(Some("Politics")),
            with_category(Some("Sports")),
        ];
        let kept = filter_articles(articles, &["Sports", "Tech"]);
        let categories: Vec<_> = kept.iter().filter_map(|a| a.category.as_deref()).collect();
        assert_eq!(categories, vec!["Technology", "Sports"]);
    }
}
