// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Password hashing for locally-registered accounts.
//!
//! OAuth-only accounts store an empty digest; verification against an empty
//! digest is always false so such accounts can never be logged into with a
//! password.

use crate::error::AppError;

/// Hash a plaintext password with bcrypt. Runs on a blocking thread since
/// bcrypt is deliberately slow.
pub async fn hash(plaintext: &str) -> Result<String, AppError> {
    let plaintext = plaintext.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(&plaintext, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

/// Compare a plaintext password against a stored digest.
///
/// An empty stored digest never matches, for any input including the empty
/// string.
pub async fn verify(plaintext: &str, digest: &str) -> Result<bool, AppError> {
    if digest.is_empty() {
        return Ok(false);
    }

    let plaintext = plaintext.to_string();
    let digest = digest.to_string();
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(&plaintext, &digest))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))?
        .unwrap_or(false);

    Ok(matched)
}
