// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! OAuth state round-trip codec.
//!
//! The state parameter carried through the Strava authorization redirect is
//! base64(JSON) and deliberately unsigned: everything decoded from it on
//! return is treated as attacker-controlled, and each consumed field is
//! revalidated independently. In particular the redirect target is resolved
//! against the host allow-list below before use, regardless of what the
//! decoded payload claims.

use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

/// What the user was doing when the OAuth flow started.
///
/// Deliberately carries no user ID: the callback is unauthenticated and the
/// state is forgeable, so an identity claimed there could never be verified.
/// Attaching Strava to an existing account goes through the authenticated
/// connect endpoint instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum StateIntent {
    /// Logging in (or signing up on first contact) via Strava
    Login,
    /// Explicit signup via Strava
    Signup,
}

/// Payload carried through the authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePayload {
    #[serde(flatten)]
    pub intent: StateIntent,
    /// Frontend URL to send the browser back to afterwards. Untrusted on
    /// return; must go through `resolve_redirect`.
    pub redirect: String,
}

/// Encode a state payload for the authorization URL.
pub fn encode(payload: &StatePayload) -> Result<String, AppError> {
    let json = serde_json::to_vec(payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("State encoding failed: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a state parameter returned from Strava. Anything that is not valid
/// base64-wrapped JSON of the expected shape is an invalid-state error.
pub fn decode(state: &str) -> Result<StatePayload, AppError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state)
        .map_err(|_| AppError::InvalidState)?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::InvalidState)
}

/// Resolve a client-supplied redirect target against the host allow-list.
///
/// A target whose host exactly matches an allow-listed host is preserved
/// verbatim; anything else (missing scheme, lookalike hosts, allow-listed
/// substrings buried in another host) silently falls back to the default
/// frontend origin.
pub fn resolve_redirect(target: &str, allowed_hosts: &[String], default: &str) -> String {
    match host_of(target) {
        Some(host) if allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) => {
            target.to_string()
        }
        _ => {
            tracing::warn!(target, "Redirect target not in allow-list, using default");
            default.to_string()
        }
    }
}

/// Extract the hostname from an http(s) URL. Returns `None` for anything
/// that does not look like an absolute http(s) URL.
pub fn host_of(target: &str) -> Option<&str> {
    let rest = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))?;

    let authority = rest.split(['/', '?', '#']).next()?;
    // Discard userinfo; the navigated-to host is what matters
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?;

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
