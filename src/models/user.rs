// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Local user ID
    pub id: i64,
    /// Email address; synthesized placeholder for OAuth-only signups
    pub email: String,
    /// Bcrypt digest; empty string for OAuth-only accounts
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Display name
    pub name: Option<String>,
    /// Profile picture URL
    pub photo_url: Option<String>,
    /// Free-form home location
    pub location: Option<String>,
    /// Preferred bike type (road, gravel, mtb, ...)
    pub bike_type: Option<String>,
    /// Self-reported experience level
    pub experience_level: Option<String>,
    /// Strava athlete ID, unique when present
    pub strava_athlete_id: Option<u64>,
    /// Strava OAuth tokens, present only while connected
    #[serde(skip_serializing, default)]
    pub strava_tokens: Option<StravaTokens>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Last modification timestamp (RFC 3339)
    pub updated_at: String,
}

impl User {
    /// Whether the account can log in with a password at all.
    pub fn has_password(&self) -> bool {
        !self.password_hash.is_empty()
    }
}

/// Strava access/refresh token pair held inside the user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StravaTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires (Unix timestamp)
    pub expires_at: i64,
}

/// Fields for creating a locally-registered user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

/// Fields for creating a user from a Strava profile.
#[derive(Debug, Clone)]
pub struct NewStravaUser {
    /// Placeholder email, locally unique
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub location: Option<String>,
    pub tokens: StravaTokens,
}
