//! Auth Handlers

pub mod auth;

pub use auth::{login, register};
