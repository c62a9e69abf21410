// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::UserResponse;
use crate::services::accounts::{self, PasswordChange, ProfileUpdate};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// API routes (require authentication via session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me", get(get_me))
        .route("/api/users", put(update_me))
        .route("/api/users/password", post(change_password))
        .route("/api/users/accounts", delete(remove_account))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile.public_view()))
}

/// Update names, email or username of the current user.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>> {
    let updated = accounts::update_profile(&state.db, &user.user_id, update).await?;
    Ok(Json(updated.public_view()))
}

// ─── Credentials ─────────────────────────────────────────────

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(change): Json<PasswordChange>,
) -> Result<StatusCode> {
    accounts::change_password(&state.db, &user.user_id, change).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct RemoveAccountParams {
    #[serde(default)]
    provider: Option<String>,
}

/// Unlink an additional OAuth provider from the current user.
async fn remove_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<RemoveAccountParams>,
) -> Result<Json<UserResponse>> {
    let provider = params.provider.unwrap_or_default();
    let updated = accounts::remove_oauth_provider(&state.db, &user.user_id, &provider).await?;
    Ok(Json(updated.public_view()))
}
