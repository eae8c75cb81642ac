// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! API routes for authenticated users, plus optionally-personalized public
//! reads.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Route, StravaTokens, User};
use crate::services::strava::StravaClient;
use crate::services::StravaConnection;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_ROUTES_PER_PAGE: u32 = 30;
const MAX_ROUTES_PER_PAGE: u32 = 100;

/// Routes requiring authentication. The auth middleware is applied in
/// routes/mod.rs.
pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/strava/status", get(strava_status))
        .route(
            "/api/strava/connect",
            post(strava_connect).delete(strava_disconnect),
        )
        .route("/api/strava/refresh", post(strava_refresh))
        .route("/api/strava/routes", get(list_strava_routes))
        .route("/api/routes/import", post(import_route))
}

/// Public routes that personalize output when a caller happens to be
/// authenticated. The optional-auth middleware is applied in routes/mod.rs.
pub fn optional_routes() -> Router<Arc<crate::AppState>> {
    Router::new().route("/routes/{id}", get(get_route))
}

// ─── User Profile ────────────────────────────────────────────

/// User as exposed over the API. Never carries the password hash or the
/// Strava token pair.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub location: Option<String>,
    pub bike_type: Option<String>,
    pub experience_level: Option<String>,
    pub strava_connected: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            photo_url: user.photo_url.clone(),
            location: user.location.clone(),
            bike_type: user.bike_type.clone(),
            experience_level: user.experience_level.clone(),
            strava_connected: user.strava_tokens.is_some(),
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<crate::AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(UserResponse::from(&user)))
}

// ─── Strava Connection ───────────────────────────────────────

/// Report whether the caller has a usable Strava connection.
async fn strava_status(
    State(state): State<Arc<crate::AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<StravaConnection>> {
    let status = state.accounts.connection_status(auth.user_id).await?;
    Ok(Json(status))
}

#[derive(Deserialize)]
pub struct ConnectRequest {
    code: String,
}

/// JSON-body connect flow: exchange a code obtained by the frontend and
/// attach the Strava identity to the current session's user.
async fn strava_connect(
    State(state): State<Arc<crate::AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ConnectRequest>,
) -> Result<Json<UserResponse>> {
    let strava = strava_client(&state)?;

    let exchange = strava.exchange_code(&payload.code).await?;
    let user = state
        .accounts
        .connect(
            auth.user_id,
            exchange.athlete.id,
            StravaTokens {
                access_token: exchange.access_token,
                refresh_token: exchange.refresh_token,
                expires_at: exchange.expires_at,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// Disconnect Strava: clears the stored token pair.
async fn strava_disconnect(
    State(state): State<Arc<crate::AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode> {
    state.accounts.disconnect(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Refresh the stored Strava token pair with a refresh-token grant.
async fn strava_refresh(
    State(state): State<Arc<crate::AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<StravaConnection>> {
    let strava = strava_client(&state)?;
    let tokens = connected_tokens(&state, &auth).await?;

    let refreshed = strava.refresh_token(&tokens.refresh_token).await?;
    state
        .accounts
        .store_refreshed_tokens(
            auth.user_id,
            StravaTokens {
                access_token: refreshed.access_token,
                refresh_token: refreshed.refresh_token,
                expires_at: refreshed.expires_at,
            },
        )
        .await?;

    let status = state.accounts.connection_status(auth.user_id).await?;
    Ok(Json(status))
}

// ─── Strava Routes ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListRoutesParams {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

/// Remote route summary for the import picker.
#[derive(Serialize)]
pub struct RemoteRouteResponse {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub distance: Option<f64>,
    pub elevation_gain: Option<f64>,
}

/// List the caller's routes on Strava (paginated).
async fn list_strava_routes(
    State(state): State<Arc<crate::AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ListRoutesParams>,
) -> Result<Json<Vec<RemoteRouteResponse>>> {
    let strava = strava_client(&state)?;
    let tokens = connected_tokens(&state, &auth).await?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_ROUTES_PER_PAGE)
        .clamp(1, MAX_ROUTES_PER_PAGE);

    let remote = strava
        .list_routes(&tokens.access_token, page, per_page)
        .await?;

    Ok(Json(
        remote
            .into_iter()
            .map(|r| RemoteRouteResponse {
                id: r.id,
                name: r.name,
                distance: r.distance,
                elevation_gain: r.elevation_gain,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct ImportRequest {
    route_id: u64,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub route: Route,
    /// False when the route had already been imported
    pub imported: bool,
}

/// Import a Strava route. Idempotent per remote route ID.
async fn import_route(
    State(state): State<Arc<crate::AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>> {
    let strava = strava_client(&state)?;
    let tokens = connected_tokens(&state, &auth).await?;

    let (route, imported) = state
        .route_imports
        .import_route(strava, payload.route_id, &tokens.access_token)
        .await?;

    Ok(Json(ImportResponse { route, imported }))
}

// ─── Public Route Reads ──────────────────────────────────────

#[derive(Serialize)]
pub struct RouteDetailResponse {
    pub route: Route,
    /// Email of the authenticated viewer, when there is one
    pub viewer: Option<String>,
}

/// Get an imported route. Anonymous callers are fine; an authenticated
/// caller gets a personalized response.
async fn get_route(
    State(state): State<Arc<crate::AppState>>,
    Path(id): Path<i64>,
    auth: Option<Extension<AuthUser>>,
) -> Result<Json<RouteDetailResponse>> {
    let route = state
        .db
        .get_route(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Route {} not found", id)))?;

    Ok(Json(RouteDetailResponse {
        route,
        viewer: auth.map(|Extension(a)| a.email),
    }))
}

// ─── Helpers ─────────────────────────────────────────────────

fn strava_client(state: &crate::AppState) -> Result<&StravaClient> {
    state.strava.as_ref().ok_or(AppError::StravaDisabled)
}

async fn current_user(state: &crate::AppState, auth: &AuthUser) -> Result<User> {
    state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))
}

/// The caller's stored Strava tokens, or a reconnect-required error when the
/// account has no usable connection.
async fn connected_tokens(state: &crate::AppState, auth: &AuthUser) -> Result<StravaTokens> {
    let user = current_user(state, auth).await?;
    user.strava_tokens.ok_or(AppError::StravaReconnectRequired)
}
