//! Registration, login, token refresh, and logout.
//!
//! The heavy lifting lives in `jx_core::auth::flow`; these handlers adapt
//! the HTTP surface and let the error mapper translate flow failures into
//! status codes.

use axum::{Json, extract::State};
use serde_json::json;

use jx_core::api::auth::{
    AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
};
use jx_core::auth::flow;

use crate::SharedState;
use crate::error::ApiError;

pub async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = flow::register(
        &state.pool,
        &state.config.tokens,
        &state.verify_key,
        &payload,
    )
    .await?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = flow::login(&state.pool, &state.config.tokens, &payload).await?;
    Ok(Json(response))
}

pub async fn refresh(
    State(state): State<SharedState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = flow::refresh(&state.pool, &state.config.tokens, &payload).await?;
    Ok(Json(response))
}

/// Revoking an unknown token still answers 200; the body says whether
/// anything was actually revoked.
pub async fn logout(
    State(state): State<SharedState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let revoked = flow::revoke(&state.pool, &payload.refresh_token).await?;
    Ok(Json(json!({ "revoked": revoked })))
}
