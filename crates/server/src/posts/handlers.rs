//! Post Handlers and Router

use crate::core::auth::middleware::mw_require_auth;
use crate::core::ctx::Ctx;
use crate::core::error::{Error, Result};
use crate::core::models::{Comment, CommentRequest, CreatePostRequest, Like, Post};
use crate::core::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, warn};

const MSG_EMPTY_POST: &str = "Please add text or an image";
const MSG_EMPTY_COMMENT: &str = "Comment text is required";
const MSG_POST_NOT_FOUND: &str = "Post not found";

pub fn router(state: AppState) -> Router<AppState> {
    let require_auth = middleware::from_fn_with_state(state, mw_require_auth);

    Router::new()
        // Listing is public, creating needs a token
        .route(
            "/api/posts",
            get(list_posts).merge(post(create_post).route_layer(require_auth.clone())),
        )
        .route(
            "/api/posts/{id}/like",
            put(toggle_like).route_layer(require_auth.clone()),
        )
        .route(
            "/api/posts/{id}/comment",
            post(add_comment).route_layer(require_auth),
        )
}

/// GET /api/posts
pub async fn list_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    Json(state.posts.list().await)
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    ctx: Ctx,
    payload: std::result::Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>)> {
    let Json(req) = payload?;

    let Some(post) = Post::new(ctx.user_id(), ctx.username(), req.text, req.image) else {
        warn!("Empty post rejected for {}", ctx.username());
        return Err(Error::validation(MSG_EMPTY_POST));
    };

    let post = state.posts.insert(post).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
) -> Result<Json<Vec<Like>>> {
    let likes = state
        .posts
        .toggle_like(&id, ctx.user_id())
        .await?
        .ok_or_else(|| Error::not_found(MSG_POST_NOT_FOUND))?;

    info!("PUT /api/posts/{}/like by {} ({} likes)", id, ctx.username(), likes.len());

    Ok(Json(likes))
}

/// POST /api/posts/{id}/comment
pub async fn add_comment(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Comment>>)> {
    if state.posts.get(&id).await.is_none() {
        return Err(Error::not_found(MSG_POST_NOT_FOUND));
    }

    let Json(req) = payload?;
    if req.text.trim().is_empty() {
        return Err(Error::validation(MSG_EMPTY_COMMENT));
    }

    let comment = Comment::new(ctx.user_id(), ctx.username(), req.text);
    let comments = state
        .posts
        .add_comment(&id, comment)
        .await?
        .ok_or_else(|| Error::not_found(MSG_POST_NOT_FOUND))?;

    info!("POST /api/posts/{}/comment by {}", id, ctx.username());

    Ok((StatusCode::CREATED, Json(comments)))
}
