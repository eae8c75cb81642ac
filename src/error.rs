// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    Forbidden,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Strava token exchange failed: {0}")]
    OAuthExchange(String),

    #[error("Strava connection expired, reconnect required")]
    StravaReconnectRequired,

    #[error("Strava denied access to the requested resource")]
    StravaPermissionDenied,

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Strava response missing required fields: {0}")]
    IncompleteRemoteData(String),

    #[error("Invalid OAuth state parameter")]
    InvalidState,

    #[error("Strava integration is not configured")]
    StravaDisabled,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    None,
                )
            }
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "invalid_token", None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Some(msg.clone()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::OAuthExchange(msg) => (
                StatusCode::BAD_GATEWAY,
                "oauth_exchange_failed",
                Some(msg.clone()),
            ),
            AppError::StravaReconnectRequired => {
                (StatusCode::UNAUTHORIZED, "strava_reconnect_required", None)
            }
            AppError::StravaPermissionDenied => (StatusCode::FORBIDDEN, "strava_forbidden", None),
            AppError::StravaApi(msg) => {
                (StatusCode::BAD_GATEWAY, "strava_error", Some(msg.clone()))
            }
            AppError::IncompleteRemoteData(msg) => (
                StatusCode::BAD_GATEWAY,
                "incomplete_remote_data",
                Some(msg.clone()),
            ),
            AppError::InvalidState => (StatusCode::BAD_REQUEST, "invalid_state", None),
            AppError::StravaDisabled => (StatusCode::SERVICE_UNAVAILABLE, "strava_disabled", None),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
