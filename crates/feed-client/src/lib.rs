//! Feed Client
//!
//! Typed access to the feed API plus the client-side identity cache:
//! a durable session file loaded at startup and an in-memory auth reducer.

pub mod api;
pub mod error;
pub mod models;
pub mod session;
pub mod state;

pub use api::FeedClient;
pub use error::{ClientError, Result};
pub use models::{AuthUser, Comment, Like, Post};
pub use session::{FeedSession, SessionStore};
pub use state::{reduce, AuthAction, AuthState};
