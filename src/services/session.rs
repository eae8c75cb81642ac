// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Session token codec.
//!
//! Issues and verifies the signed HS256 bearer tokens that back user
//! sessions. There is no revocation list: logout is purely client-side and a
//! token stays valid until its expiry.

use crate::error::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Placeholder value shipped in `.env.example`; signing with it would make
/// every deployment's tokens forgeable, so it is rejected like an unset
/// secret.
const PLACEHOLDER_SECRET: &str = "change-me";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (local user ID)
    pub sub: String,
    /// Email at time of issue
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Codec for session tokens, constructed once at startup and injected where
/// needed.
#[derive(Clone)]
pub struct SessionCodec {
    secret: String,
    ttl_secs: i64,
}

impl SessionCodec {
    pub fn new(secret: String, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    /// Fail closed: an unset or placeholder secret must never silently sign
    /// or verify anything.
    fn signing_key(&self) -> Result<&[u8], AppError> {
        if self.secret.is_empty() || self.secret == PLACEHOLDER_SECRET {
            return Err(AppError::Config(
                "JWT_SECRET is unset or still the placeholder value".to_string(),
            ));
        }
        Ok(self.secret.as_bytes())
    }

    /// Issue a session token for a user.
    pub fn issue(&self, user_id: i64, email: &str) -> Result<String, AppError> {
        let key = self.signing_key()?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as i64;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now as usize,
            exp: (now + self.ttl_secs) as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    /// Verify a token and return its claims. Malformed, tampered and expired
    /// tokens all map to `Forbidden`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let key = self.signing_key()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &DecodingKey::from_secret(key), &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Forbidden)
    }
}
