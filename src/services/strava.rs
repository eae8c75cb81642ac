// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Strava API client.
//!
//! Handles:
//! - Building the authorization URL
//! - Authorization-code and refresh-token grants
//! - Athlete profile fetch
//! - Route fetch (metadata + best-effort track stream) and listing
//!
//! The client is constructed explicitly from config and injected into the
//! services that need it; there is no process-wide instance. No call retries
//! automatically, and error messages never carry the client secret or raw
//! upstream bodies (those are logged instead).

use crate::config::StravaConfig;
use crate::error::AppError;
use serde::Deserialize;

const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
const STRAVA_OAUTH_BASE: &str = "https://www.strava.com/oauth";

/// OAuth scopes requested at authorization.
const OAUTH_SCOPES: &str = "read,profile:read_all";

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_base: String,
    oauth_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl StravaClient {
    /// Create a client from OAuth credentials.
    pub fn new(config: &StravaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: STRAVA_API_BASE.to_string(),
            oauth_base: STRAVA_OAUTH_BASE.to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// Point the client at a different server. Used by tests that stand up a
    /// loopback Strava.
    pub fn with_base_urls(mut self, api_base: &str, oauth_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self.oauth_base = oauth_base.to_string();
        self
    }

    // ─── OAuth ───────────────────────────────────────────────────────────────

    /// Build the authorization redirect URL. Pure, no I/O.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.oauth_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            OAUTH_SCOPES,
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for a token pair.
    ///
    /// Any non-success response surfaces as an exchange error carrying only
    /// the upstream status; the body is logged, never returned, so the
    /// client secret cannot leak through error propagation.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuthExchange(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::OAuthExchange(format!("upstream status {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::OAuthExchange(format!("unparseable response: {}", e)))
    }

    /// Exchange a refresh token for a fresh token pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuthExchange(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token refresh failed");
            // A rejected refresh token means the connection is gone
            if status == reqwest::StatusCode::BAD_REQUEST
                || status == reqwest::StatusCode::UNAUTHORIZED
            {
                return Err(AppError::StravaReconnectRequired);
            }
            return Err(AppError::OAuthExchange(format!("upstream status {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::OAuthExchange(format!("unparseable response: {}", e)))
    }

    // ─── API Calls ───────────────────────────────────────────────────────────

    /// Get the authenticated athlete's profile.
    pub async fn fetch_athlete(&self, access_token: &str) -> Result<StravaAthlete, AppError> {
        let url = format!("{}/athlete", self.api_base);
        self.get_json(&url, access_token, &[]).await
    }

    /// Get a route by ID. Mandatory part of an import.
    pub async fn get_route(
        &self,
        route_id: u64,
        access_token: &str,
    ) -> Result<StravaRoute, AppError> {
        let url = format!("{}/routes/{}", self.api_base, route_id);
        self.get_json(&url, access_token, &[]).await
    }

    /// Get the lat/lng track stream for a route, encoded as a polyline.
    ///
    /// Best-effort: failures are logged and reported as `None` so a missing
    /// stream never aborts an import.
    pub async fn get_route_track(&self, route_id: u64, access_token: &str) -> Option<String> {
        let url = format!("{}/routes/{}/streams", self.api_base, route_id);
        let streams: Vec<StravaStream> = match self.get_json(&url, access_token, &[]).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(route_id, error = %e, "Route track stream fetch failed");
                return None;
            }
        };

        let latlng = streams.into_iter().find(|s| s.stream_type == "latlng")?;
        let points: Vec<[f64; 2]> = match serde_json::from_value(latlng.data) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(route_id, error = %e, "Unexpected latlng stream shape");
                return None;
            }
        };
        let coords = points
            .into_iter()
            .map(|[lat, lng]| geo_types::coord! { x: lng, y: lat });

        match polyline::encode_coordinates(coords, 5) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(route_id, error = %e, "Track stream polyline encoding failed");
                None
            }
        }
    }

    /// List the athlete's routes (paginated).
    pub async fn list_routes(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaRoute>, AppError> {
        let url = format!("{}/athlete/routes", self.api_base);
        self.get_json(
            &url,
            access_token,
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    /// Generic GET with bearer auth, JSON response and upstream status
    /// translation.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, url, "Strava API error");

            // 401 means the token expired or was revoked: the caller should
            // prompt a reconnect. 403 is a scope/permission problem.
            return Err(match status.as_u16() {
                401 => AppError::StravaReconnectRequired,
                403 => AppError::StravaPermissionDenied,
                _ => AppError::StravaApi(format!("upstream status {}", status)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// Token exchange response (authorization-code grant). Strava includes a
/// summary of the athlete.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub athlete: StravaAthlete,
}

/// Token refresh response (refresh-token grant). No athlete here.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Athlete profile. Strava does not expose the athlete's email.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub profile: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl StravaAthlete {
    /// Best-effort display name from first/last name.
    pub fn display_name(&self) -> Option<String> {
        match (self.firstname.as_deref(), self.lastname.as_deref()) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            (Some(f), None) => Some(f.to_string()),
            (None, Some(l)) => Some(l.to_string()),
            (None, None) => None,
        }
    }

    /// Best-effort location from city/state.
    pub fn location(&self) -> Option<String> {
        match (self.city.as_deref(), self.state.as_deref()) {
            (Some(c), Some(s)) => Some(format!("{}, {}", c, s)),
            (Some(c), None) => Some(c.to_string()),
            (None, Some(s)) => Some(s.to_string()),
            (None, None) => None,
        }
    }
}

/// Route as returned by the routes endpoints. Fields are optional so import
/// validation can report exactly what is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaRoute {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub distance: Option<f64>,
    pub elevation_gain: Option<f64>,
    pub estimated_moving_time: Option<u64>,
    pub map: Option<StravaMap>,
}

impl StravaRoute {
    /// Get the route polyline, preferring the detailed one.
    pub fn polyline(&self) -> Option<&str> {
        let map = self.map.as_ref()?;
        map.polyline.as_deref().or(map.summary_polyline.as_deref())
    }
}

/// Route map data with polylines.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaMap {
    pub polyline: Option<String>,
    pub summary_polyline: Option<String>,
}

/// One stream from the route streams endpoint. Stream payload shape depends
/// on the stream type, so `data` stays untyped until the latlng stream is
/// picked out.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaStream {
    #[serde(rename = "type")]
    pub stream_type: String,
    pub data: serde_json::Value,
}
