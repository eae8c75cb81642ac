// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Services module - business logic layer.

pub mod accounts;
pub mod oauth_state;
pub mod password;
pub mod route_import;
pub mod session;
pub mod strava;

pub use accounts::{AccountService, StravaConnection};
pub use route_import::RouteImportService;
pub use session::SessionCodec;
pub use strava::StravaClient;
