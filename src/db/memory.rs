// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! In-process store implementing the data-access contract.
//!
//! Provides typed operations for:
//! - Users (local accounts and Strava-linked accounts)
//! - Routes (imported from Strava)
//!
//! Uniqueness of `email`, `strava_athlete_id` and `strava_route_id` is the
//! authority for every find-or-create: the `upsert_*` operations go through a
//! single `DashMap` entry per unique key, so concurrent callers converge on
//! one row instead of racing a lookup against a create. A relational backend
//! would enforce the same contract with unique indexes and `ON CONFLICT`.

use crate::error::AppError;
use crate::models::{NewRoute, NewStravaUser, NewUser, Route, StravaTokens, User};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// In-memory database with per-key atomic upserts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    users: DashMap<i64, User>,
    routes: DashMap<i64, Route>,
    /// Unique index: email -> user id
    users_by_email: DashMap<String, i64>,
    /// Unique index: Strava athlete id -> user id
    users_by_strava_id: DashMap<u64, i64>,
    /// Unique index: Strava route id -> route id
    routes_by_strava_id: DashMap<u64, i64>,
    /// Unique index: RideWithGPS route id -> route id
    routes_by_rwgps_id: DashMap<u64, i64>,
    next_user_id: AtomicI64,
    next_route_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a locally-registered user. Fails with a conflict if the email
    /// is already taken.
    pub async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let now = Utc::now().to_rfc3339();

        // The email entry is the uniqueness authority; holding it covers the
        // row insert so a racing create with the same email blocks here.
        match self.inner.users_by_email.entry(new.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Email {} is already registered",
                new.email
            ))),
            Entry::Vacant(slot) => {
                let id = self.inner.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
                let user = User {
                    id,
                    email: new.email,
                    password_hash: new.password_hash,
                    name: new.name,
                    photo_url: None,
                    location: None,
                    bike_type: None,
                    experience_level: None,
                    strava_athlete_id: None,
                    strava_tokens: None,
                    created_at: now.clone(),
                    updated_at: now,
                };
                self.inner.users.insert(id, user.clone());
                slot.insert(id);
                Ok(user)
            }
        }
    }

    /// Get a user by local ID.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.inner.users.get(&id).map(|u| u.clone()))
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match self.inner.users_by_email.get(email) {
            Some(id) => self.get_user(*id).await,
            None => Ok(None),
        }
    }

    /// Get a user by Strava athlete ID.
    pub async fn get_user_by_strava_id(&self, athlete_id: u64) -> Result<Option<User>, AppError> {
        match self.inner.users_by_strava_id.get(&athlete_id) {
            Some(id) => self.get_user(*id).await,
            None => Ok(None),
        }
    }

    /// Atomic find-or-create keyed on the Strava athlete ID.
    ///
    /// If a user with this athlete ID exists, its token pair and photo are
    /// refreshed and it is returned with `false`. Otherwise a new OAuth-only
    /// user (empty password hash) is created and returned with `true`.
    /// Concurrent first-time logins for the same athlete serialize on the
    /// index entry and converge on a single row.
    pub async fn upsert_user_by_strava_id(
        &self,
        athlete_id: u64,
        new: NewStravaUser,
    ) -> Result<(User, bool), AppError> {
        let now = Utc::now().to_rfc3339();

        match self.inner.users_by_strava_id.entry(athlete_id) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let mut user = self
                    .inner
                    .users
                    .get_mut(&id)
                    .ok_or_else(|| AppError::Database(format!("User {} index is dangling", id)))?;
                user.strava_tokens = Some(new.tokens);
                if new.photo_url.is_some() {
                    user.photo_url = new.photo_url;
                }
                user.updated_at = now;
                Ok((user.clone(), false))
            }
            Entry::Vacant(slot) => {
                let id = self.inner.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
                let user = User {
                    id,
                    email: new.email.clone(),
                    password_hash: String::new(),
                    name: new.name,
                    photo_url: new.photo_url,
                    location: new.location,
                    bike_type: None,
                    experience_level: None,
                    strava_athlete_id: Some(athlete_id),
                    strava_tokens: Some(new.tokens),
                    created_at: now.clone(),
                    updated_at: now,
                };
                self.inner.users.insert(id, user.clone());
                self.inner.users_by_email.insert(new.email, id);
                slot.insert(id);
                Ok((user, true))
            }
        }
    }

    /// Attach Strava identity and tokens to an existing local user.
    ///
    /// Fails with a conflict if the athlete ID already belongs to a
    /// different user.
    pub async fn link_strava_account(
        &self,
        user_id: i64,
        athlete_id: u64,
        tokens: StravaTokens,
    ) -> Result<User, AppError> {
        match self.inner.users_by_strava_id.entry(athlete_id) {
            Entry::Occupied(slot) if *slot.get() != user_id => Err(AppError::Conflict(format!(
                "Strava athlete {} is already linked to another account",
                athlete_id
            ))),
            entry => {
                let mut user = self.inner.users.get_mut(&user_id).ok_or_else(|| {
                    AppError::NotFound(format!("User {} not found", user_id))
                })?;
                user.strava_athlete_id = Some(athlete_id);
                user.strava_tokens = Some(tokens);
                user.updated_at = Utc::now().to_rfc3339();
                if let Entry::Vacant(slot) = entry {
                    slot.insert(user_id);
                }
                Ok(user.clone())
            }
        }
    }

    /// Clear stored Strava tokens (disconnect). The athlete ID mapping is
    /// kept so a later reconnect lands on the same account.
    pub async fn clear_strava_tokens(&self, user_id: i64) -> Result<(), AppError> {
        let mut user = self
            .inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.strava_tokens = None;
        user.updated_at = Utc::now().to_rfc3339();
        Ok(())
    }

    // ─── Route Operations ────────────────────────────────────────

    /// Get a route by local ID.
    pub async fn get_route(&self, id: i64) -> Result<Option<Route>, AppError> {
        Ok(self.inner.routes.get(&id).map(|r| r.clone()))
    }

    /// Get a route by Strava route ID.
    pub async fn get_route_by_strava_id(&self, route_id: u64) -> Result<Option<Route>, AppError> {
        match self.inner.routes_by_strava_id.get(&route_id) {
            Some(id) => self.get_route(*id).await,
            None => Ok(None),
        }
    }

    /// Get a route by RideWithGPS route ID.
    pub async fn get_route_by_rwgps_id(&self, route_id: u64) -> Result<Option<Route>, AppError> {
        match self.inner.routes_by_rwgps_id.get(&route_id) {
            Some(id) => self.get_route(*id).await,
            None => Ok(None),
        }
    }

    /// Atomic find-or-create keyed on the Strava route ID. Returns the route
    /// and whether it was newly created.
    pub async fn upsert_route_by_strava_id(
        &self,
        route_id: u64,
        new: NewRoute,
    ) -> Result<(Route, bool), AppError> {
        match self.inner.routes_by_strava_id.entry(route_id) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let route = self.inner.routes.get(&id).ok_or_else(|| {
                    AppError::Database(format!("Route {} index is dangling", id))
                })?;
                Ok((route.clone(), false))
            }
            Entry::Vacant(slot) => {
                let id = self.inner.next_route_id.fetch_add(1, Ordering::SeqCst) + 1;
                let route = Route {
                    id,
                    strava_route_id: Some(route_id),
                    rwgps_route_id: None,
                    name: new.name,
                    distance: new.distance,
                    elevation_gain: new.elevation_gain,
                    polyline: new.polyline,
                    estimated_moving_time: new.estimated_moving_time,
                    created_at: Utc::now().to_rfc3339(),
                };
                self.inner.routes.insert(id, route.clone());
                slot.insert(id);
                Ok((route, true))
            }
        }
    }

    /// Atomic find-or-create keyed on the RideWithGPS route ID. Same contract
    /// as the Strava variant; the two indexes are independent.
    pub async fn upsert_route_by_rwgps_id(
        &self,
        route_id: u64,
        new: NewRoute,
    ) -> Result<(Route, bool), AppError> {
        match self.inner.routes_by_rwgps_id.entry(route_id) {
            Entry::Occupied(slot) => {
                let id = *slot.get();
                let route = self.inner.routes.get(&id).ok_or_else(|| {
                    AppError::Database(format!("Route {} index is dangling", id))
                })?;
                Ok((route.clone(), false))
            }
            Entry::Vacant(slot) => {
                let id = self.inner.next_route_id.fetch_add(1, Ordering::SeqCst) + 1;
                let route = Route {
                    id,
                    strava_route_id: None,
                    rwgps_route_id: Some(route_id),
                    name: new.name,
                    distance: new.distance,
                    elevation_gain: new.elevation_gain,
                    polyline: new.polyline,
                    estimated_moving_time: new.estimated_moving_time,
                    created_at: Utc::now().to_rfc3339(),
                };
                self.inner.routes.insert(id, route.clone());
                slot.insert(id);
                Ok((route, true))
            }
        }
    }
}
