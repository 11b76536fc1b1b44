//! Feed server configuration

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::core::auth::token::MAX_TOKEN_TTL_DAYS;
use crate::core::auth::AuthManager;
use crate::core::store::JsonPostStore;

/// Range bcrypt accepts for its work factor
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Configuration for the feed server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Port the HTTP listener binds to
    pub port: u16,
    /// Root data directory
    pub data_dir: PathBuf,
    /// One JSON document per post
    pub posts_dir: PathBuf,
    /// User database connection string
    pub database_url: String,
    /// HMAC secret for bearer tokens
    pub jwt_secret: String,
    /// Token lifetime in days
    pub token_ttl_days: i64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl ServerConfig {
    /// Create config rooted at a data directory, with defaults for everything else
    pub fn with_base_dir(base_dir: impl Into<PathBuf>, jwt_secret: impl Into<String>) -> Self {
        let data_dir = base_dir.into();
        Self {
            port: 5001,
            posts_dir: data_dir.join("posts"),
            database_url: sqlite_url(&data_dir.join("users.sqlite")),
            data_dir,
            jwt_secret: jwt_secret.into(),
            token_ttl_days: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Load from the process environment (after an optional `.env` file)
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {:?}", path);
        }

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build and validate a config from a variable lookup
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = get("FEED_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("feed_data"));
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;

        let mut config = Self::with_base_dir(data_dir, jwt_secret);
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        config.port = parse_var("PORT", get("PORT"), config.port)?;
        config.token_ttl_days = parse_var(
            "JWT_EXPIRES_IN_DAYS",
            get("JWT_EXPIRES_IN_DAYS"),
            config.token_ttl_days,
        )?;
        config.bcrypt_cost = parse_var("BCRYPT_COST", get("BCRYPT_COST"), config.bcrypt_cost)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail once requests arrive
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.token_ttl_days) {
            bail!(
                "JWT_EXPIRES_IN_DAYS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_DAYS,
                self.token_ttl_days
            );
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            bail!(
                "BCRYPT_COST must be between {} and {}, got {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST,
                self.bcrypt_cost
            );
        }
        Ok(())
    }

    /// Ensure all directories exist
    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::create_dir_all(&self.posts_dir).await?;
        Ok(())
    }
}

fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}")),
        None => Ok(default),
    }
}

fn sqlite_url(path: &std::path::Path) -> String {
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub auth: Arc<AuthManager>,
    pub posts: Arc<JsonPostStore>,
}

impl AppState {
    /// Open both stores described by `config`
    pub async fn init(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        config.ensure_dirs().await?;

        let auth = Arc::new(AuthManager::new(&config).await?);
        info!("Auth Manager initialized");

        let posts = Arc::new(JsonPostStore::new(config.posts_dir.clone()).await?);
        info!("JSON PostStore initialized");

        Ok(Self {
            config,
            auth,
            posts,
        })
    }

    /// Address the HTTP listener binds to, on every interface
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.config.port))
    }
}
