// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use account_kit::config::{Config, DeploymentMode};
use account_kit::db::DocumentDb;
use account_kit::routes::create_router;
use account_kit::AppState;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use http_body_util::BodyExt;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> DocumentDb {
    DocumentDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by in-memory storage.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

/// Create a test app running in the given deployment mode.
#[allow(dead_code)]
pub fn create_test_app_with_mode(mode: DeploymentMode) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config {
        mode,
        ..Config::default()
    })
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config,
        db: DocumentDb::new_in_memory(),
    });

    (create_router(state.clone()), state)
}

/// Create a session token the auth middleware accepts.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, secret: &[u8]) -> String {
    account_kit::middleware::auth::create_session_token(user_id, secret)
        .expect("Failed to create session token")
}

/// Build a JSON request.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Signup payload with valid defaults.
#[allow(dead_code)]
pub fn signup_body(username: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "first_name": "Bob",
        "last_name": "Builder",
        "email": email,
        "username": username,
        "password": "password123"
    })
}

/// Extract the `session=...` pair from a response's Set-Cookie headers.
#[allow(dead_code)]
pub fn session_cookie_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
