// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Local registration and login flow tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn post_json(app: axum::Router, uri: &str, body: Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_register_then_login_yields_verifiable_token() {
    let (app, state) = common::create_test_app();

    let response = post_json(
        app.clone(),
        "/auth/register",
        json!({"email": "jo@example.com", "password": "pedal-pedal", "name": "Jo"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let registered = read_json(response).await;
    let registered_id = registered["user"]["id"].as_i64().unwrap();

    let response = post_json(
        app,
        "/auth/login",
        json!({"email": "jo@example.com", "password": "pedal-pedal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    // The login token must verify and carry the registered user's id
    let claims = state
        .sessions
        .verify(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, registered_id.to_string());
    assert_eq!(claims.email, "jo@example.com");

    // Sensitive fields never appear in responses
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("strava_tokens").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let (app, _state) = common::create_test_app();

    let response = post_json(
        app.clone(),
        "/auth/register",
        json!({"email": "jo@example.com", "password": "pedal-pedal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app.clone(),
        "/auth/login",
        json!({"email": "jo@example.com", "password": "wrong-password"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        app,
        "/auth/login",
        json!({"email": "nobody@example.com", "password": "pedal-pedal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _state) = common::create_test_app();

    let body = json!({"email": "dup@example.com", "password": "pedal-pedal"});
    let response = post_json(app.clone(), "/auth/register", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(app, "/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_registration_validates_input_shape() {
    let (app, _state) = common::create_test_app();

    let response = post_json(
        app.clone(),
        "/auth/register",
        json!({"email": "not-an-email", "password": "pedal-pedal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app,
        "/auth/register",
        json!({"email": "short@example.com", "password": "tiny"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
