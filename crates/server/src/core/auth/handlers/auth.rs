//! Auth handlers

use crate::core::config::AppState;
use crate::core::error::Result;
use crate::core::models::{AuthResponse, LoginRequest, RegisterRequest};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use tracing::info;

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    info!("POST /api/users/register - {}", req.email);

    let resp = state
        .auth
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(req) = payload?;
    info!("POST /api/users/login - {}", req.email);

    let resp = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(resp))
}
