// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; nothing in this module performs I/O
//! after `from_env` returns.

use std::env;

/// Default session lifetime in days when `JWT_TTL_DAYS` is unset.
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Default frontend origin for OAuth redirects
    pub frontend_url: String,
    /// Hostnames that client-supplied redirect targets may point at
    pub allowed_redirect_hosts: Vec<String>,
    /// JWT signing secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    pub jwt_ttl_secs: i64,
    /// Strava OAuth credentials; `None` disables the integration
    pub strava: Option<StravaConfig>,
}

/// Strava OAuth application credentials.
#[derive(Debug, Clone)]
pub struct StravaConfig {
    /// OAuth client ID (public)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Registered callback URL
    pub redirect_uri: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Strava credentials are optional: if any of them is missing the
    /// integration is disabled rather than failing startup, unless
    /// `REQUIRE_STRAVA=true` makes their absence fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        // The frontend host is always an acceptable redirect target;
        // ALLOWED_REDIRECT_HOSTS adds more (comma-separated hostnames).
        let mut allowed_redirect_hosts: Vec<String> = env::var("ALLOWED_REDIRECT_HOSTS")
            .unwrap_or_default()
            .split(',')
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if let Some(host) = crate::services::oauth_state::host_of(&frontend_url) {
            if !allowed_redirect_hosts.iter().any(|h| h == host) {
                allowed_redirect_hosts.push(host.to_string());
            }
        }

        let strava = Self::strava_from_env()?;
        if strava.is_none() {
            tracing::warn!("Strava credentials not set, integration disabled");
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url,
            allowed_redirect_hosts,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_ttl_secs: env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_DAYS)
                * 24
                * 60
                * 60,
            strava,
        })
    }

    /// Read Strava credentials, honoring the `REQUIRE_STRAVA` flag.
    fn strava_from_env() -> Result<Option<StravaConfig>, ConfigError> {
        let required = env::var("REQUIRE_STRAVA")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let client_id = env::var("STRAVA_CLIENT_ID").ok();
        let client_secret = env::var("STRAVA_CLIENT_SECRET")
            .ok()
            .map(|v| v.trim().to_string());
        let redirect_uri = env::var("STRAVA_REDIRECT_URI").ok();

        match (client_id, client_secret, redirect_uri) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(Some(StravaConfig {
                client_id,
                client_secret,
                redirect_uri,
            })),
            _ if required => Err(ConfigError::Missing(
                "STRAVA_CLIENT_ID / STRAVA_CLIENT_SECRET / STRAVA_REDIRECT_URI",
            )),
            _ => Ok(None),
        }
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            allowed_redirect_hosts: vec!["localhost".to_string(), "rideout.cc".to_string()],
            jwt_secret: "test_jwt_secret_32_bytes_minimum!".to_string(),
            jwt_ttl_secs: DEFAULT_TOKEN_TTL_DAYS * 24 * 60 * 60,
            strava: Some(StravaConfig {
                client_id: "test_client_id".to_string(),
                client_secret: "test_client_secret".to_string(),
                redirect_uri: "http://localhost:8080/auth/strava/callback".to_string(),
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
