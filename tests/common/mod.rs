// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Shared test helpers: app construction and a loopback Strava stand-in.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use rideout::config::Config;
use rideout::routes::create_router;
use rideout::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Athlete ID the fake Strava reports for a successful exchange.
#[allow(dead_code)]
pub const FAKE_ATHLETE_ID: u64 = 4242;

/// Access token the fake Strava accepts.
#[allow(dead_code)]
pub const FAKE_ACCESS_TOKEN: &str = "fake-access";

/// Create a test app with in-memory storage and default test config.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default()));
    (create_router(state.clone()), state)
}

/// Create a test app with the Strava integration disabled.
#[allow(dead_code)]
pub fn create_test_app_without_strava() -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.strava = None;
    let state = Arc::new(AppState::new(config));
    (create_router(state.clone()), state)
}

/// Create a test app whose Strava client points at a fake server.
#[allow(dead_code)]
pub fn create_test_app_with_strava(fake: &FakeStrava) -> (axum::Router, Arc<AppState>) {
    let mut state = AppState::new(Config::test_default());
    state.strava = state
        .strava
        .map(|c| c.with_base_urls(&fake.api_base, &fake.oauth_base));
    let state = Arc::new(state);
    (create_router(state.clone()), state)
}

// ─── Fake Strava ─────────────────────────────────────────────

/// Handle to a loopback server imitating the Strava API.
#[allow(dead_code)]
pub struct FakeStrava {
    pub api_base: String,
    pub oauth_base: String,
    /// Number of GET /routes/{id} hits, to assert import idempotency
    pub route_fetches: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct FakeState {
    route_fetches: Arc<AtomicUsize>,
}

/// Spawn a fake Strava on an ephemeral loopback port.
///
/// Behavior:
/// - `POST /oauth/token`: `code=good-code` succeeds, anything else is 400;
///   refresh grant succeeds for `fake-refresh`
/// - bearer `fake-access` is valid, `expired-token` yields 401,
///   `no-scope-token` yields 403
/// - routes 1001 (complete), 1002 (missing distance), 1003 (track only via
///   streams), 1004 (no track anywhere, streams endpoint broken)
#[allow(dead_code)]
pub async fn spawn_fake_strava() -> FakeStrava {
    let route_fetches = Arc::new(AtomicUsize::new(0));
    let state = FakeState {
        route_fetches: route_fetches.clone(),
    };

    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/api/v3/athlete", get(athlete))
        .route("/api/v3/athlete/routes", get(athlete_routes))
        .route("/api/v3/routes/{id}", get(route_by_id))
        .route("/api/v3/routes/{id}/streams", get(route_streams))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake Strava");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeStrava {
        api_base: format!("http://{}/api/v3", addr),
        oauth_base: format!("http://{}/oauth", addr),
        route_fetches,
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// 401 for the expired token, 403 for the scope-less token, None when valid.
fn token_gate(headers: &HeaderMap) -> Option<StatusCode> {
    match bearer(headers) {
        Some("expired-token") | None => Some(StatusCode::UNAUTHORIZED),
        Some("no-scope-token") => Some(StatusCode::FORBIDDEN),
        Some(_) => None,
    }
}

fn fake_athlete() -> Value {
    json!({
        "id": FAKE_ATHLETE_ID,
        "firstname": "Fake",
        "lastname": "Rider",
        "profile": "https://img.example/fake.jpg",
        "city": "Girona",
        "state": null,
    })
}

async fn token(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some("good-code") => (
            StatusCode::OK,
            Json(json!({
                "access_token": FAKE_ACCESS_TOKEN,
                "refresh_token": "fake-refresh",
                "expires_at": 4102444800i64,
                "athlete": fake_athlete(),
            })),
        ),
        Some("refresh_token")
            if form.get("refresh_token").map(String::as_str) == Some("fake-refresh") =>
        {
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": "fake-access-2",
                    "refresh_token": "fake-refresh-2",
                    "expires_at": 4102444800i64,
                })),
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Bad Request", "errors": [{"code": "invalid"}]})),
        ),
    }
}

async fn athlete(headers: HeaderMap) -> impl IntoResponse {
    if let Some(status) = token_gate(&headers) {
        return (status, Json(json!({"message": "Authorization Error"})));
    }
    (StatusCode::OK, Json(fake_athlete()))
}

async fn athlete_routes(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if let Some(status) = token_gate(&headers) {
        return (status, Json(json!({"message": "Authorization Error"})));
    }
    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let routes = if page == 1 {
        json!([
            {"id": 1001, "name": "Coast Loop", "distance": 42000.0, "elevation_gain": 650.0},
            {"id": 1003, "name": "Gravel Out-and-Back", "distance": 18000.0, "elevation_gain": 220.0},
        ])
    } else {
        json!([])
    };
    (StatusCode::OK, Json(routes))
}

async fn route_by_id(
    State(state): State<FakeState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(status) = token_gate(&headers) {
        return (status, Json(json!({"message": "Authorization Error"})));
    }
    state.route_fetches.fetch_add(1, Ordering::SeqCst);

    let body = match id {
        1001 => json!({
            "id": 1001,
            "name": "Coast Loop",
            "distance": 42000.0,
            "elevation_gain": 650.0,
            "estimated_moving_time": 6300,
            "map": {"polyline": null, "summary_polyline": "u{~vFvyys@fS]"},
        }),
        1002 => json!({
            "id": 1002,
            "name": "Broken Export",
            "map": {"polyline": null, "summary_polyline": null},
        }),
        1003 | 1004 => json!({
            "id": id,
            "name": "Gravel Out-and-Back",
            "distance": 18000.0,
            "elevation_gain": 220.0,
            "estimated_moving_time": 4200,
            "map": null,
        }),
        _ => return (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))),
    };
    (StatusCode::OK, Json(body))
}

async fn route_streams(Path(id): Path<u64>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(status) = token_gate(&headers) {
        return (status, Json(json!({"message": "Authorization Error"})));
    }
    if id == 1003 {
        (
            StatusCode::OK,
            Json(json!([
                {"type": "distance", "data": [[0.0, 0.0]]},
                {"type": "latlng", "data": [[37.0, -122.0], [37.01, -122.01], [37.02, -122.0]]},
            ])),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "stream export failed"})),
        )
    }
}
