//! Post Service Layer
//!
//! Feed listing plus the authenticated post, like and comment mutations.

pub mod handlers;

pub use handlers::router;
