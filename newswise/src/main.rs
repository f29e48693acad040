/*
newswise - single-binary main.rs
This binary wires the news, context, user and recommendation components together
and serves all of them from one Rocket HTTP server.
*/

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use common::{Config, LlmConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newswise::context::{ArticleAnalyzer, ContextService, RemoteContextClient};
use newswise::feed::{NewsFeed, NewsService, RemoteNewsFeed};
use newswise::ingestion::NewsApiClient;
use newswise::llm::gemini::GeminiProvider;
use newswise::llm::remote::RemoteLlmProvider;
use newswise::llm::LlmProvider;
use newswise::personalization::Recommender;
use newswise::processing::EnrichmentPipeline;
use newswise::server::{launch_rocket, AppState};
use newswise::storage::SqliteUserStore;

const DEFAULT_NEWS_KEY_ENV: &str = "NEWS_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
// a remote news service enriches every article before answering
const REMOTE_FEED_TIMEOUT_SECS: u64 = 300;

#[derive(Parser, Debug)]
#[command(name = "newswise", about = "NewsWise news enrichment and recommendation server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("failed to load configuration: {:#}", e);
            return Err(e);
        }
    };
    config.validate()?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    // User store
    let db_pool = common::init_db_pool(&config.database.path).await?;
    common::ensure_schema(&db_pool).await?;
    common::sync_users(&config, &db_pool).await?;
    info!(db_path = %config.database.path, users = config.users.len(), "user store ready");

    // Context service over the configured LLM
    let llm = match config.llm.as_ref() {
        Some(llm_config) => match create_llm_provider(llm_config) {
            Ok(provider) => Some(provider),
            Err(e) => {
                error!("Failed to initialize LLM provider: {:#}", e);
                None
            }
        },
        None => {
            warn!("No [llm] section configured; context endpoints are disabled");
            None
        }
    };
    let context = llm.map(|provider| Arc::new(ContextService::new(provider)));

    let analyzer: Arc<dyn ArticleAnalyzer> = match (&config.services.context_url, &context) {
        (Some(url), _) => {
            info!(%url, "using remote context service");
            Arc::new(RemoteContextClient::new(url.clone(), DEFAULT_TIMEOUT_SECS)?)
        }
        (None, Some(ctx)) => ctx.clone() as Arc<dyn ArticleAnalyzer>,
        (None, None) => anyhow::bail!(
            "article enrichment needs an LLM provider or services.context_url"
        ),
    };

    // News source + enrichment
    let news_key_env = config
        .news
        .api_key_env
        .as_deref()
        .unwrap_or(DEFAULT_NEWS_KEY_ENV);
    let news_key = news_api_key(
        news_key_env,
        std::env::var(news_key_env).ok(),
        config.services.news_url.is_some(),
    )?;
    let source = NewsApiClient::new(
        config.news.base_url(),
        news_key,
        config.news.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
    )?;
    let news = Arc::new(NewsService::new(
        Arc::new(source),
        EnrichmentPipeline::new(analyzer),
    ));

    // Recommendations
    let feed: Arc<dyn NewsFeed> = match &config.services.news_url {
        Some(url) => {
            info!(%url, "using remote news service for recommendations");
            Arc::new(RemoteNewsFeed::new(url.clone(), REMOTE_FEED_TIMEOUT_SECS)?)
        }
        None => news.clone() as Arc<dyn NewsFeed>,
    };
    let users = Arc::new(SqliteUserStore::new(db_pool));
    let recommender = Arc::new(Recommender::new(
        users.clone(),
        feed,
        config.recommendation.source.clone(),
    ));

    let server_config = config.server.clone();
    let state = AppState {
        started_at: Utc::now(),
        config: Some(Arc::new(config)),
        users,
        context,
        news,
        recommender,
    };

    info!("Launching Rocket HTTP server");
    if let Err(e) = launch_rocket(state, &server_config).await {
        error!("Rocket server failed: {:#}", e);
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Create an LLM provider based on configuration
fn create_llm_provider(llm_config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let adapter = llm_config.adapter.as_deref().unwrap_or("gemini");
    match adapter {
        "gemini" => {
            let cfg = llm_config.gemini.clone().unwrap_or_default();
            let api_key = api_key(cfg.api_key_env.as_deref().unwrap_or("GEMINI_API_KEY"))?;
            let model = cfg
                .model
                .unwrap_or_else(|| common::DEFAULT_GEMINI_MODEL.to_string());
            let api_url = cfg
                .api_url
                .unwrap_or_else(|| common::DEFAULT_GEMINI_URL.to_string());
            info!(%model, "Gemini LLM provider initialized");

            Ok(Arc::new(
                GeminiProvider::new(api_url, api_key, model).with_defaults(
                    cfg.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
                    cfg.max_tokens,
                ),
            ))
        }
        "remote" => {
            let cfg = llm_config
                .remote
                .clone()
                .context("Remote adapter selected but no [llm.remote] config found")?;
            let api_key_env = cfg
                .api_key_env
                .as_deref()
                .context("Missing api_key_env in remote config")?;
            let api_key = api_key(api_key_env)?;
            let model = cfg.model.unwrap_or_else(|| "gpt-4o-mini".to_string());
            let api_url = cfg
                .api_url
                .unwrap_or_else(|| "http://localhost:11434/v1/chat/completions".to_string());
            info!(%model, %api_url, "OpenAI-compatible LLM provider initialized");

            Ok(Arc::new(
                RemoteLlmProvider::new(api_url, api_key, model).with_defaults(
                    cfg.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
                    cfg.max_tokens.unwrap_or(500),
                    0.7,
                ),
            ))
        }
        _ => anyhow::bail!("Unknown LLM adapter type: {}", adapter),
    }
}

/// The headline key is only mandatory when this process builds the recommendation
/// feed itself. With a remote news service, the local `/api/news` route runs keyless.
fn news_api_key(env_var: &str, value: Option<String>, remote_feed: bool) -> Result<String> {
    match value {
        Some(key) => Ok(key),
        None if remote_feed => {
            warn!(
                env_var,
                "news API key not set; local /api/news requests will be rejected upstream"
            );
            Ok(String::new())
        }
        None => anyhow::bail!("news API key env var '{}' not set", env_var),
    }
}

fn api_key(env_var: &str) -> Result<String> {
    std::env::var(env_var).with_context(|| format!("LLM API key env var '{}' not set", env_var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_key_required_without_remote_feed() {
        let err = news_api_key("NEWS_API_KEY", None, false).unwrap_err();
        assert!(err.to_string().contains("NEWS_API_KEY"));
    }

    #[test]
    fn news_key_optional_with_remote_feed() {
        assert_eq!(news_api_key("NEWS_API_KEY", None, true).unwrap(), "");
        assert_eq!(
            news_api_key("NEWS_API_KEY", Some("k".into()), true).unwrap(),
            "k"
        );
    }
}
