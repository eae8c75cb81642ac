// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Authentication routes: local register/login and the Strava OAuth
//! redirect flow.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::StravaTokens;
use crate::routes::api::UserResponse;
use crate::services::oauth_state::{self, StateIntent, StatePayload};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/strava", get(strava_start))
        .route("/auth/strava/callback", get(strava_callback))
}

// ─── Local Accounts ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email address"))]
    email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: String,
    name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Session response returned by register and login.
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Register a local account.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (user, token) = state
        .accounts
        .register(&payload.email, &payload.password, payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let (user, token) = state.accounts.login(&payload.email, &payload.password).await?;

    Ok(Json(SessionResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Logout is client-side: tokens stay valid until expiry, the client just
/// drops its copy. This endpoint only exists as a redirect target.
async fn logout() -> Redirect {
    Redirect::temporary("/")
}

// ─── Strava OAuth Flow ───────────────────────────────────────

#[derive(Deserialize)]
pub struct StravaStartParams {
    /// "login" (default) or "signup"
    #[serde(default)]
    intent: Option<String>,
    /// Frontend URL to send the browser back to afterwards
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start the OAuth flow: encode intent + redirect into the state parameter
/// and send the browser to Strava.
async fn strava_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StravaStartParams>,
) -> Result<Redirect> {
    let strava = state.strava.as_ref().ok_or(AppError::StravaDisabled)?;

    // Validate the redirect target on the way in as well as on return
    let redirect = oauth_state::resolve_redirect(
        params.redirect_uri.as_deref().unwrap_or(&state.config.frontend_url),
        &state.config.allowed_redirect_hosts,
        &state.config.frontend_url,
    );

    let intent = match params.intent.as_deref() {
        Some("signup") => StateIntent::Signup,
        _ => StateIntent::Login,
    };

    let oauth_state = oauth_state::encode(&StatePayload { intent, redirect })?;
    let auth_url = strava.authorize_url(&oauth_state);

    tracing::info!("Starting Strava OAuth flow");
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: reconcile the identity and send the browser back to the
/// frontend with a session token.
///
/// This endpoint is unauthenticated and only ever logs in or signs up.
/// Attaching Strava to an existing account requires a verified session and
/// goes through `POST /api/strava/connect`; the state payload cannot name a
/// user to link to.
async fn strava_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let strava = state.strava.as_ref().ok_or(AppError::StravaDisabled)?;

    // The state parameter is attacker-controlled on return: a payload that
    // does not decode gets the default frontend, and the redirect target it
    // claims is re-validated against the allow-list either way.
    let payload = match oauth_state::decode(&params.state) {
        Ok(p) => p,
        Err(_) => {
            tracing::warn!("Malformed OAuth state parameter on callback");
            let redirect = format!("{}?error=invalid_state", state.config.frontend_url);
            return Ok(Redirect::temporary(&redirect));
        }
    };
    let redirect = oauth_state::resolve_redirect(
        &payload.redirect,
        &state.config.allowed_redirect_hosts,
        &state.config.frontend_url,
    );

    // User denied access, or Strava reported an error
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Ok(Redirect::temporary(&format!(
            "{}?error={}",
            redirect,
            urlencoding::encode(&error)
        )));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::Validation("missing authorization code".to_string()))?;

    let exchange = strava.exchange_code(&code).await?;
    let tokens = StravaTokens {
        access_token: exchange.access_token,
        refresh_token: exchange.refresh_token,
        expires_at: exchange.expires_at,
    };

    let (user, is_new) = state
        .accounts
        .find_or_create_from_athlete(&exchange.athlete, tokens)
        .await?;
    let token = state.accounts.issue_session_for(&user)?;

    Ok(Redirect::temporary(&format!(
        "{}/callback?token={}&new={}",
        redirect, token, is_new
    )))
}
