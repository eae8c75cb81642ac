// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Rideout: backend for a social cycling and event-planning app.
//!
//! This crate covers the authentication core: local accounts with signed
//! session tokens, the Strava OAuth login/connect flow, and idempotent
//! import of Strava routes.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::MemoryStore;
use services::{AccountService, RouteImportService, SessionCodec, StravaClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: MemoryStore,
    pub sessions: SessionCodec,
    pub accounts: AccountService,
    pub route_imports: RouteImportService,
    /// `None` when Strava credentials are not configured
    pub strava: Option<StravaClient>,
}

impl AppState {
    /// Wire up the services for a given configuration.
    pub fn new(config: Config) -> Self {
        let db = MemoryStore::new();
        let sessions = SessionCodec::new(config.jwt_secret.clone(), config.jwt_ttl_secs);
        let accounts = AccountService::new(db.clone(), sessions.clone());
        let route_imports = RouteImportService::new(db.clone());
        let strava = config.strava.as_ref().map(StravaClient::new);

        Self {
            config,
            db,
            sessions,
            accounts,
            route_imports,
            strava,
        }
    }
}
