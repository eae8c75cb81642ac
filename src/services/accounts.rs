// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Account service: local registration/login and Strava identity
//! reconciliation.

use crate::db::MemoryStore;
use crate::error::AppError;
use crate::models::{NewStravaUser, NewUser, StravaTokens, User};
use crate::services::password;
use crate::services::session::SessionCodec;
use crate::services::strava::StravaAthlete;
use serde::Serialize;

/// Account business logic over the store and the session codec.
#[derive(Clone)]
pub struct AccountService {
    db: MemoryStore,
    sessions: SessionCodec,
}

/// Whether a user currently has a usable Strava connection.
///
/// Returned from a query method rather than signalled by an error:
/// "not connected" is an ordinary answer, not an exceptional condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StravaConnection {
    Connected {
        /// Access token expiry (Unix timestamp) as last reported by Strava
        expires_at: i64,
    },
    NotConnected,
}

impl AccountService {
    pub fn new(db: MemoryStore, sessions: SessionCodec) -> Self {
        Self { db, sessions }
    }

    // ─── Local Accounts ──────────────────────────────────────────────────────

    /// Register a local account. The email must be unused; uniqueness is
    /// enforced by the store, so a racing duplicate surfaces as a conflict
    /// from `create_user` rather than from a pre-check.
    pub async fn register(
        &self,
        email: &str,
        plaintext_password: &str,
        name: Option<String>,
    ) -> Result<(User, String), AppError> {
        let password_hash = password::hash(plaintext_password).await?;

        let user = self
            .db
            .create_user(NewUser {
                email: email.to_string(),
                password_hash,
                name,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");

        let token = self.issue_session_for(&user)?;
        Ok((user, token))
    }

    /// Log in with email and password, returning the user and a fresh
    /// session token.
    pub async fn login(&self, email: &str, plaintext_password: &str) -> Result<(User, String), AppError> {
        let user = self
            .db
            .get_user_by_email(email)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        // OAuth-only accounts have an empty digest, which never matches
        if !password::verify(plaintext_password, &user.password_hash).await? {
            tracing::warn!(user_id = user.id, "Failed login attempt");
            return Err(AppError::Unauthenticated);
        }

        let token = self.issue_session_for(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, token))
    }

    /// Issue a session token for a user.
    pub fn issue_session_for(&self, user: &User) -> Result<String, AppError> {
        self.sessions.issue(user.id, &user.email)
    }

    // ─── Strava Identity Reconciliation ──────────────────────────────────────

    /// Find or create the local user for a Strava athlete.
    ///
    /// Keyed on the athlete ID via an atomic upsert: concurrent first-time
    /// logins from the same athlete converge on one user. Repeat logins
    /// refresh the stored token pair and profile photo. Strava does not
    /// expose the athlete's email, so first-time signups get a synthesized
    /// placeholder address and an empty password hash.
    pub async fn find_or_create_from_athlete(
        &self,
        athlete: &StravaAthlete,
        tokens: StravaTokens,
    ) -> Result<(User, bool), AppError> {
        let (user, is_new) = self
            .db
            .upsert_user_by_strava_id(
                athlete.id,
                NewStravaUser {
                    email: placeholder_email(athlete.id),
                    name: athlete.display_name(),
                    photo_url: athlete.profile.clone(),
                    location: athlete.location(),
                    tokens,
                },
            )
            .await?;

        tracing::info!(
            user_id = user.id,
            athlete_id = athlete.id,
            is_new,
            "Strava identity reconciled"
        );
        Ok((user, is_new))
    }

    /// Attach a Strava identity to an existing, already-authenticated user.
    pub async fn connect(
        &self,
        user_id: i64,
        athlete_id: u64,
        tokens: StravaTokens,
    ) -> Result<User, AppError> {
        let user = self.db.link_strava_account(user_id, athlete_id, tokens).await?;
        tracing::info!(user_id, athlete_id, "Strava account connected");
        Ok(user)
    }

    /// Report whether a user has a Strava connection.
    pub async fn connection_status(&self, user_id: i64) -> Result<StravaConnection, AppError> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(match user.strava_tokens {
            Some(tokens) => StravaConnection::Connected {
                expires_at: tokens.expires_at,
            },
            None => StravaConnection::NotConnected,
        })
    }

    /// Drop stored Strava tokens for a user.
    pub async fn disconnect(&self, user_id: i64) -> Result<(), AppError> {
        self.db.clear_strava_tokens(user_id).await?;
        tracing::info!(user_id, "Strava account disconnected");
        Ok(())
    }

    /// Store a refreshed token pair for a connected user.
    pub async fn store_refreshed_tokens(
        &self,
        user_id: i64,
        tokens: StravaTokens,
    ) -> Result<(), AppError> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        let athlete_id = user
            .strava_athlete_id
            .ok_or(AppError::StravaReconnectRequired)?;
        self.db.link_strava_account(user_id, athlete_id, tokens).await?;
        Ok(())
    }
}

/// Synthesize a locally-unique placeholder email for an OAuth-only signup.
fn placeholder_email(athlete_id: u64) -> String {
    format!("strava_{}@riders.rideout.local", athlete_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AccountService {
        AccountService::new(
            MemoryStore::new(),
            SessionCodec::new("unit_test_secret_32_bytes_long!!".to_string(), 3600),
        )
    }

    fn athlete(id: u64) -> StravaAthlete {
        StravaAthlete {
            id,
            firstname: Some("Jo".to_string()),
            lastname: Some("Rider".to_string()),
            profile: Some("https://img.example/jo.jpg".to_string()),
            city: Some("Girona".to_string()),
            state: None,
        }
    }

    fn tokens(access: &str) -> StravaTokens {
        StravaTokens {
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 4102444800,
        }
    }

    #[tokio::test]
    async fn test_oauth_only_account_cannot_password_login() {
        let svc = service();
        let (user, is_new) = svc
            .find_or_create_from_athlete(&athlete(5), tokens("a1"))
            .await
            .unwrap();
        assert!(is_new);
        assert!(!user.has_password());

        // Empty password against the empty stored digest must still fail
        let err = svc.login(&user.email, "").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_reconciliation_is_idempotent() {
        let svc = service();
        let (first, new1) = svc
            .find_or_create_from_athlete(&athlete(9), tokens("a1"))
            .await
            .unwrap();
        let (second, new2) = svc
            .find_or_create_from_athlete(&athlete(9), tokens("a2"))
            .await
            .unwrap();

        assert!(new1);
        assert!(!new2);
        assert_eq!(first.id, second.id);
        assert_eq!(second.strava_tokens.unwrap().access_token, "a2");
    }

    #[tokio::test]
    async fn test_connect_rejects_athlete_owned_by_other_user() {
        let svc = service();
        let (owner, _) = svc
            .find_or_create_from_athlete(&athlete(33), tokens("a1"))
            .await
            .unwrap();

        let (other, _) = svc
            .register("someone@example.com", "pedal-pedal", None)
            .await
            .unwrap();
        assert_ne!(owner.id, other.id);

        let err = svc.connect(other.id, 33, tokens("a2")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_connection_status_roundtrip() {
        let svc = service();
        let (user, _) = svc
            .register("status@example.com", "pedal-pedal", None)
            .await
            .unwrap();

        assert_eq!(
            svc.connection_status(user.id).await.unwrap(),
            StravaConnection::NotConnected
        );

        svc.connect(user.id, 77, tokens("a1")).await.unwrap();
        assert_eq!(
            svc.connection_status(user.id).await.unwrap(),
            StravaConnection::Connected {
                expires_at: 4102444800
            }
        );

        svc.disconnect(user.id).await.unwrap();
        assert_eq!(
            svc.connection_status(user.id).await.unwrap(),
            StravaConnection::NotConnected
        );
    }
}
