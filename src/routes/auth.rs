// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local account session routes: sign-up, sign-in and sign-out.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_token, removal_cookie, session_cookie};
use crate::models::{User, UserResponse};
use crate::services::accounts::{self, SignupRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/signout", post(signout))
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Attach a fresh session cookie for `user` to the jar.
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar> {
    let token = create_session_token(&user.id, &state.config.session_secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))?;
    Ok(jar.add(session_cookie(token, state.config.mode.is_secure())))
}

/// Create a local account and sign it in.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>)> {
    let user = accounts::sign_up(&state.db, request).await?;
    let jar = start_session(&state, jar, &user)?;
    Ok((StatusCode::CREATED, jar, Json(user.public_view())))
}

/// Verify credentials and start a session.
async fn signin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SigninRequest>,
) -> Result<(CookieJar, Json<UserResponse>)> {
    let user = accounts::sign_in(&state.db, &request.username, &request.password).await?;
    let jar = start_session(&state, jar, &user)?;
    Ok((jar, Json(user.public_view())))
}

/// Clear the session cookie.
async fn signout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(removal_cookie(state.config.mode.is_secure()));
    (jar, StatusCode::NO_CONTENT)
}
