// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! JWT authentication middleware.
//!
//! Two modes over the same `Authorization: Bearer` extraction:
//! - required: missing credential is 401, present-but-invalid is 403
//! - optional: the request proceeds anonymously on missing or invalid tokens
//!
//! On success the verified identity is attached to request extensions as
//! [`AuthUser`]; downstream handlers treat its absence as an anonymous
//! caller, never as an error.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from a verified session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

/// Pull the raw token out of the `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Verify a token and build the identity it asserts.
fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = state.sessions.verify(token)?;
    let user_id: i64 = claims.sub.parse().map_err(|_| AppError::Forbidden)?;
    Ok(AuthUser {
        user_id,
        email: claims.email,
    })
}

/// Middleware that requires a valid session token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthenticated)?;
    let auth_user = authenticate(&state, token)?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Middleware that attaches an identity when a valid token happens to be
/// present, and otherwise lets the request through anonymously.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        if let Ok(auth_user) = authenticate(&state, token) {
            request.extensions_mut().insert(auth_user);
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);
    }
}
