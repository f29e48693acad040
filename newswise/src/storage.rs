use anyhow::{anyhow, Context, Result};
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::model::User;

/// User records, looked up by id or email.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`EmailTaken`] when the email is already in use.
    async fn create(&self, new_user: &NewUser) -> Result<User>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Raw interest string. `None` when the user does not exist.
    /// A user without interests yields `Some("")`.
    async fn interest(&self, id: i64) -> Result<Option<String>> {
        Ok(self
            .find_by_id(id)
            .await?
            .map(|u| u.interest.unwrap_or_default()))
    }
}

/// Body of `POST /users`
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub interest: Option<String>,
}

// SQLITE_CONSTRAINT_UNIQUE
const UNIQUE_VIOLATION: &str = "2067";

/// Returned by [`UserStore::create`] when the email is already registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTaken(pub String);

impl std::fmt::Display for EmailTaken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a user with email {} already exists", self.0)
    }
}

impl std::error::Error for EmailTaken {}

/// Hash a password with Argon2 and a random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("failed to hash password: {}", e))
}

const SELECT_USER: &str =
    "SELECT id, username, email, password_hash, interest, created_at FROM users";

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, new_user: &NewUser) -> Result<User> {
        let password_hash = hash_password(&new_user.password)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash, interest) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(&new_user.interest)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    return anyhow::Error::new(EmailTaken(new_user.email.clone()));
                }
            }
            anyhow::Error::new(e).context(format!("failed to insert user {}", new_user.email))
        })?;

        info!(user_id = id, "created user");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("user {} vanished after insert", id))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{} WHERE id = ?", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch user {}", id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{} WHERE email = ?", SELECT_USER))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch user by email {}", email))
    }
}
