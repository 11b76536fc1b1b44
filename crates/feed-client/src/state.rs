//! Auth view state
//!
//! A pure reducer: every change to the logged-in identity, the loading flag
//! and the last error goes through [`reduce`].

use crate::models::AuthUser;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// Initial state seeded from the durable session, if any
    pub fn with_user(user: Option<AuthUser>) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    LoginRequest,
    RegisterRequest,
    LoginSuccess(AuthUser),
    RegisterSuccess(AuthUser),
    LoginFail(String),
    RegisterFail(String),
    Logout,
}

pub fn reduce(state: AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::LoginRequest | AuthAction::RegisterRequest => AuthState {
            loading: true,
            error: None,
            ..state
        },
        AuthAction::LoginSuccess(user) | AuthAction::RegisterSuccess(user) => AuthState {
            user: Some(user),
            loading: false,
            error: None,
        },
        AuthAction::LoginFail(message) | AuthAction::RegisterFail(message) => AuthState {
            loading: false,
            error: Some(message),
            ..state
        },
        // Clears the identity only; a stale error stays visible
        AuthAction::Logout => AuthState { user: None, ..state },
    }
}
