//! Durable session cache and the login/register/logout flow
//!
//! The logged-in identity is written to a small JSON file so it survives
//! restarts. It is read once when a [`FeedSession`] is created, replaced on
//! every successful login or register, and removed on logout.

use crate::api::FeedClient;
use crate::error::Result;
use crate::models::AuthUser;
use crate::state::{reduce, AuthAction, AuthState};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

const SESSION_FILE: &str = "user.json";

/// The local durable key holding the authenticated identity
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/feed/user.json`, falling back to the working directory
    pub fn default_location() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("feed").join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files mean "nobody logged in"
    pub async fn load(&self) -> Option<AuthUser> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return None,
        };

        match serde_json::from_str(&content) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring corrupt session file at {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub async fn save(&self, user: &AuthUser) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(user)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// API client plus the cached identity and auth view state
pub struct FeedSession {
    client: FeedClient,
    store: SessionStore,
    state: AuthState,
}

impl FeedSession {
    /// Create a session, restoring any identity saved by a previous run
    pub async fn load(client: FeedClient, store: SessionStore) -> Self {
        let user = store.load().await;
        if let Some(user) = &user {
            info!("Restored session for {}", user.username);
        }
        Self {
            client,
            store,
            state: AuthState::with_user(user),
        }
    }

    pub fn client(&self) -> &FeedClient {
        &self.client
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.state.user.as_ref()
    }

    fn dispatch(&mut self, action: AuthAction) {
        self.state = reduce(std::mem::take(&mut self.state), action);
    }

    /// Returns whether the login succeeded; failures land in `state().error`
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        self.dispatch(AuthAction::LoginRequest);

        match self.client.login(email, password).await {
            Ok(user) => {
                if let Err(e) = self.store.save(&user).await {
                    warn!("Failed to persist session: {}", e);
                }
                self.dispatch(AuthAction::LoginSuccess(user));
                true
            }
            Err(e) => {
                self.dispatch(AuthAction::LoginFail(e.user_message("Login failed")));
                false
            }
        }
    }

    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> bool {
        self.dispatch(AuthAction::RegisterRequest);

        match self.client.register(username, email, password).await {
            Ok(user) => {
                if let Err(e) = self.store.save(&user).await {
                    warn!("Failed to persist session: {}", e);
                }
                self.dispatch(AuthAction::RegisterSuccess(user));
                true
            }
            Err(e) => {
                self.dispatch(AuthAction::RegisterFail(e.user_message("Signup failed")));
                false
            }
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.store.clear().await?;
        self.dispatch(AuthAction::Logout);
        Ok(())
    }
}
