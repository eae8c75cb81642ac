// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Data models for the application.

pub mod route;
pub mod user;

pub use route::{NewRoute, Route};
pub use user::{NewStravaUser, NewUser, StravaTokens, User};
