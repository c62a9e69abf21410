// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify that session cookies are issued with the expected
//! attributes, and that sign-out removes them with matching attributes, in
//! plain-HTTP and secure deployments.

use account_kit::config::DeploymentMode;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn signout(mode: DeploymentMode) -> Response {
    let (app, _) = common::create_test_app_with_mode(mode);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/auth/signout")
            .header(header::COOKIE, "session=test")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_signup_cookie_attributes() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/auth/signup",
            common::signup_body("bob", "bob@example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookies = set_cookie_headers(&response);
    let session = find_cookie(&set_cookies, "session");

    assert!(session.contains("Path=/"));
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Max-Age=86400"));
    assert!(!session.contains("Secure"));
}

#[tokio::test]
async fn test_signup_cookie_secure_mode() {
    let (app, _) = common::create_test_app_with_mode(DeploymentMode::Secure);

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/auth/signup",
            common::signup_body("bob", "bob@example.com"),
        ))
        .await
        .unwrap();

    let set_cookies = set_cookie_headers(&response);
    let session = find_cookie(&set_cookies, "session");
    assert!(session.contains("Secure"));
}

#[tokio::test]
async fn test_signout_cookie_removal_attributes() {
    let response = signout(DeploymentMode::Development).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let session = find_cookie(&set_cookies, "session");

    assert!(session.contains("Path=/"));
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Max-Age=0"));
    assert!(!session.contains("Secure"));
    assert!(!session.contains("Domain="));
}

#[tokio::test]
async fn test_signout_cookie_removal_secure_attributes() {
    let response = signout(DeploymentMode::Secure).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let session = find_cookie(&set_cookies, "session");

    assert!(session.contains("Path=/"));
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("Max-Age=0"));
    assert!(session.contains("Secure"));
}
