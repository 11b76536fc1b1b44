//! Authentication Module
//!
//! Handles registration, login and bearer token verification.
//! Accounts live in a SQLite database; tokens are stateless JWTs.

pub mod handlers;
pub mod middleware;
pub mod token;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::ServerConfig;
use crate::core::error::{Error, Result};
use crate::core::models::AuthResponse;
use token::TokenSigner;

const MSG_MISSING_FIELDS: &str = "Please add all fields";
const MSG_USER_EXISTS: &str = "User already exists";
const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials";
const MSG_TOKEN_FAILED: &str = "Not authorized, token failed";
const MSG_USER_NOT_FOUND: &str = "Not authorized, user not found";

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at";

/// User record stored in database
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public user info (no sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// Auth manager handles all authentication
pub struct AuthManager {
    pool: SqlitePool,
    tokens: TokenSigner,
    bcrypt_cost: u32,
}

impl AuthManager {
    /// Connect to the user database and prepare the schema
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .with_context(|| format!("Invalid DATABASE_URL {}", config.database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to open user database")?;

        let manager = Self {
            pool,
            tokens: TokenSigner::new(&config.jwt_secret, config.token_ttl_days)?,
            bcrypt_cost: config.bcrypt_cost,
        };

        manager.init_db().await?;

        info!("[Auth] Initialized at {}", config.database_url);

        Ok(manager)
    }

    async fn init_db(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create users table")?;

        Ok(())
    }

    /// Register a new user and issue their first token
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(Error::validation(MSG_MISSING_FIELDS));
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = ? OR username = ?")
                .bind(email)
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() {
            warn!("[Auth] Registration rejected, {} / {} taken", username, email);
            return Err(Error::validation(MSG_USER_EXISTS));
        }

        let password_hash = hash_password(password.to_string(), self.bcrypt_cost).await?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };

        let insert = format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?)");
        let inserted = sqlx::query(&insert)
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {}
            // Lost a race with a concurrent registration
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(Error::validation(MSG_USER_EXISTS));
            }
            Err(e) => return Err(e.into()),
        }

        info!("[Auth] User registered: {} ({})", user.username, user.email);

        self.respond_with_token(user)
    }

    /// Check credentials and issue a fresh token
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let user = self.find_user_by("email", email.trim()).await?;

        let Some(user) = user else {
            warn!("[Auth] Failed login attempt for {}", email);
            return Err(Error::auth(MSG_INVALID_CREDENTIALS));
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            warn!("[Auth] Failed login attempt for {}", email);
            return Err(Error::auth(MSG_INVALID_CREDENTIALS));
        }

        info!("[Auth] User logged in: {}", user.username);

        self.respond_with_token(user)
    }

    /// Resolve a bearer token to the user it was issued for
    pub async fn verify_token(&self, token: &str) -> Result<UserInfo> {
        let claims = self.tokens.verify(token).map_err(|e| {
            warn!("[Auth] {}", e);
            Error::auth(MSG_TOKEN_FAILED)
        })?;

        self.get_user(&claims.sub)
            .await?
            .ok_or_else(|| Error::auth(MSG_USER_NOT_FOUND))
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserInfo>> {
        let user = self.find_user_by("id", user_id).await?;
        Ok(user.map(UserInfo::from))
    }

    /// Look up a single user by a unique column (`id` or `email`)
    async fn find_user_by(&self, column: &'static str, key: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;
        let created_at = created_at
            .parse::<DateTime<Utc>>()
            .with_context(|| format!("Corrupt created_at {created_at:?} for user {id}"))?;

        Ok(Some(User {
            id,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created_at,
        }))
    }

    fn respond_with_token(&self, user: User) -> Result<AuthResponse> {
        let token = self.tokens.issue(&user.id)?;
        Ok(AuthResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            token,
        })
    }
}

// bcrypt runs on the blocking pool
async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("Password verification task failed")?
        .context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn manager(dir: &TempDir) -> AuthManager {
        let mut config = ServerConfig::with_base_dir(dir.path(), "test-secret");
        config.bcrypt_cost = 4;
        config.ensure_dirs().await.unwrap();
        AuthManager::new(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_token_resolves_to_new_user() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;

        let resp = auth
            .register("alice", "alice@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(resp.username, "alice");
        assert_eq!(resp.email, "alice@example.com");

        let user = auth.verify_token(&resp.token).await.unwrap();
        assert_eq!(user.id, resp.id);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;

        for (u, e, p) in [
            ("", "a@example.com", "pw"),
            ("a", "", "pw"),
            ("a", "a@example.com", ""),
        ] {
            let err = auth.register(u, e, p).await.unwrap_err();
            assert!(matches!(err, Error::Validation(ref m) if m == MSG_MISSING_FIELDS));
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_and_username() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;
        auth.register("alice", "alice@example.com", "pw").await.unwrap();

        let err = auth
            .register("alice2", "alice@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m == MSG_USER_EXISTS));

        let err = auth
            .register("alice", "other@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m == MSG_USER_EXISTS));
    }

    #[tokio::test]
    async fn test_login_fails_on_any_single_char_mutation() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;
        let registered = auth
            .register("bob", "bob@example.com", "s3cret")
            .await
            .unwrap();

        let ok = auth.login("bob@example.com", "s3cret").await.unwrap();
        assert_eq!(ok.id, registered.id);

        let password: Vec<char> = "s3cret".chars().collect();
        for i in 0..password.len() {
            let mut mutated = password.clone();
            mutated[i] = if mutated[i] == 'x' { 'y' } else { 'x' };
            let mutated: String = mutated.into_iter().collect();

            let err = auth.login("bob@example.com", &mutated).await.unwrap_err();
            assert!(matches!(err, Error::Auth(ref m) if m == MSG_INVALID_CREDENTIALS));
        }
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;

        let err = auth.login("ghost@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_verify_token_for_missing_user() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;
        let token = auth.tokens.issue("no-such-user").unwrap();

        let err = auth.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, Error::Auth(ref m) if m == MSG_USER_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_verify_token_rejects_malformed() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;

        let err = auth.verify_token("garbage").await.unwrap_err();
        assert!(matches!(err, Error::Auth(ref m) if m == MSG_TOKEN_FAILED));
    }

    #[tokio::test]
    async fn test_corrupt_created_at_is_an_internal_error() {
        let dir = TempDir::new().unwrap();
        let auth = manager(&dir).await;
        let resp = auth.register("carol", "carol@example.com", "pw").await.unwrap();

        sqlx::query("UPDATE users SET created_at = 'not-a-date' WHERE id = ?")
            .bind(&resp.id)
            .execute(&auth.pool)
            .await
            .unwrap();

        let err = auth.get_user(&resp.id).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        let err = auth.login("carol@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_new_rejects_out_of_range_token_lifetime() {
        let dir = TempDir::new().unwrap();
        let mut config = ServerConfig::with_base_dir(dir.path(), "test-secret");
        config.token_ttl_days = 100_000_000;
        config.ensure_dirs().await.unwrap();

        assert!(AuthManager::new(&config).await.is_err());
    }
}
