/*!
common/src/lib.rs

Shared configuration types and DB helper functions for NewsWise.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default file with an override file
- Helpers to initialize an SQLite database and seed configured users
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Top-headlines endpoint used when `[news] base_url` is not set.
pub const DEFAULT_NEWS_URL: &str = "https://newsapi.org/v2/top-headlines";

/// Gemini models endpoint used when `[llm.gemini] api_url` is not set.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// News source the recommendation feed is built from unless configured otherwise.
pub const DEFAULT_RECOMMENDATION_SOURCE: &str = "bbc-news";

/// Database configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the sqlite database file (e.g. "data/newswise.db")
    pub path: String,
}

/// HTTP bind settings, merged into Rocket's figment at launch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Headline provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsConfig {
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl NewsConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_NEWS_URL)
    }
}

/// Remote LLM endpoint config, shared by the Gemini and OpenAI-compatible adapters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
}

/// LLM top-level config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub adapter: Option<String>, // "gemini", "remote"
    pub gemini: Option<RemoteLlmConfig>,
    // OpenAI-compatible chat completions endpoint
    pub remote: Option<RemoteLlmConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_recommendation_source")]
    pub source: String,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            source: default_recommendation_source(),
        }
    }
}

fn default_recommendation_source() -> String {
    DEFAULT_RECOMMENDATION_SOURCE.to_string()
}

/// Optional remote service locations. When unset the in-process components are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Base URL of a context service exposing `/api/context/topic` and `/api/context/summarize`
    pub context_url: Option<String>,
    /// Base URL of a news service exposing `/api/news/summarized-news`
    pub news_url: Option<String>,
}

/// Users seeded into the user store at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, see the `hash_password` binary
    pub password_hash: Option<String>,
    /// `|`-separated interest tags, e.g. "Sports|Technology"
    pub interest: Option<String>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub news: NewsConfig,
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Check that every configured endpoint is a well-formed absolute URL.
    pub fn validate(&self) -> Result<()> {
        let mut urls: Vec<(&str, &str)> = vec![("news.base_url", self.news.base_url())];
        if let Some(llm) = &self.llm {
            if let Some(u) = llm.gemini.as_ref().and_then(|g| g.api_url.as_deref()) {
                urls.push(("llm.gemini.api_url", u));
            }
            if let Some(u) = llm.remote.as_ref().and_then(|r| r.api_url.as_deref()) {
                urls.push(("llm.remote.api_url", u));
            }
        }
        if let Some(u) = self.services.context_url.as_deref() {
            urls.push(("services.context_url", u));
        }
        if let Some(u) = self.services.news_url.as_deref() {
            urls.push(("services.news_url", u));
        }

        for (key, value) in urls {
            url::Url::parse(value).with_context(|| format!("Invalid URL for {}: {}", key, value))?;
        }
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// Initialize an SQLite connection pool.
///
/// Creates the parent directory if necessary and returns a configured `SqlitePool`
/// with a modest connection limit.
pub async fn init_db_pool(path: &str) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create DB parent directory: {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to sqlite database at path: {}", path))?;

    Ok(pool)
}

/// Create the `users` table if it does not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT,
            interest TEXT,
            created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create users table")?;
    Ok(())
}

/// Ensure that users defined in the configuration are present in the `users` table.
///  - INSERT OR IGNORE a row per configured user (keyed by email, safe to call repeatedly)
///  - UPDATE `interest` and `password_hash` when the config provides them
pub async fn sync_users(config: &Config, pool: &SqlitePool) -> Result<()> {
    for u in &config.users {
        sqlx::query(
            "INSERT OR IGNORE INTO users (username, email, password_hash, interest) VALUES (?, ?, ?, ?)",
        )
        .bind(&u.username)
        .bind(&u.email)
        .bind(u.password_hash.clone())
        .bind(u.interest.clone())
        .execute(pool)
        .await
        .with_context(|| format!("failed to insert or ignore user {}", u.email))?;

        sqlx::query(
            "UPDATE users SET interest = COALESCE(?, interest), password_hash = COALESCE(?, password_hash) WHERE email = ?",
        )
        .bind(u.interest.clone())
        .bind(u.password_hash.clone())
        .bind(&u.email)
        .execute(pool)
        .await
        .with_context(|| format!("failed to update user {}", u.email))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [database]
        path = "data/test.db"

        [[users]]
        username = "alice"
        email = "alice@example.com"
        interest = "Sports|Technology"
    "#;

    #[test]
    fn config_defaults_apply() {
        let cfg: Config = toml::from_str(MINIMAL).expect("parse config");
        assert_eq!(cfg.recommendation.source, "bbc-news");
        assert_eq!(cfg.news.base_url(), DEFAULT_NEWS_URL);
        assert!(cfg.llm.is_none());
        assert!(cfg.services.context_url.is_none());
        assert_eq!(cfg.users.len(), 1);
        assert_eq!(cfg.users[0].interest.as_deref(), Some("Sports|Technology"));
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn validate_rejects_relative_url() {
        let mut cfg: Config = toml::from_str(MINIMAL).expect("parse config");
        cfg.services.news_url = Some("localhost-without-scheme".to_string());
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("services.news_url"));
    }

    #[tokio::test]
    async fn override_file_wins_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");
        std::fs::write(&default_path, MINIMAL).unwrap();
        std::fs::write(
            &override_path,
            "[recommendation]\nsource = \"cnn\"\n[server]\nport = 9090\n",
        )
        .unwrap();

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("load config");
        assert_eq!(cfg.recommendation.source, "cnn");
        assert_eq!(cfg.server.port, Some(9090));
        assert_eq!(cfg.database.path, "data/test.db");
        assert_eq!(cfg.users.len(), 1);
    }

    #[tokio::test]
    async fn db_pool_schema_and_user_sync() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("newswise.db");
        let pool = init_db_pool(&db_path.to_string_lossy())
            .await
            .expect("init pool");
        ensure_schema(&pool).await.expect("schema");

        let mut cfg: Config = toml::from_str(MINIMAL).expect("parse config");
        sync_users(&cfg, &pool).await.expect("first sync");

        cfg.users[0].interest = Some("Space".to_string());
        sync_users(&cfg, &pool).await.expect("second sync");

        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT email, interest FROM users")
                .fetch_all(&pool)
                .await
                .expect("select users");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "alice@example.com");
        assert_eq!(rows[0].1.as_deref(), Some("Space"));
    }
}
