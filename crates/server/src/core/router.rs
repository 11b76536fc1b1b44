//! Core Router
//!
//! Assembles the public auth routes, the post routes and the shared layers.

use crate::core::auth::handlers as auth_handlers;
use crate::core::AppState;
use crate::posts;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        // Auth routes
        .route("/api/users/register", post(auth_handlers::register))
        .route("/api/users/login", post(auth_handlers::login))
        .merge(posts::router(state.clone()))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "API is running..."
}
