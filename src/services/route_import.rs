// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Route import: find-or-create local routes keyed by Strava route ID.

use crate::db::MemoryStore;
use crate::error::AppError;
use crate::models::{NewRoute, Route};
use crate::services::strava::StravaClient;

/// Imports Strava routes into local storage, idempotently.
#[derive(Clone)]
pub struct RouteImportService {
    db: MemoryStore,
}

impl RouteImportService {
    pub fn new(db: MemoryStore) -> Self {
        Self { db }
    }

    /// Import a Strava route.
    ///
    /// If the route was imported before, the stored row is returned without
    /// touching Strava. Otherwise the metadata fetch is mandatory, the track
    /// stream fetch is best-effort, and the create is an atomic upsert keyed
    /// on the Strava route ID, so two concurrent imports converge on one
    /// row. Returns the route and whether this call imported it.
    pub async fn import_route(
        &self,
        strava: &StravaClient,
        route_id: u64,
        access_token: &str,
    ) -> Result<(Route, bool), AppError> {
        if let Some(existing) = self.db.get_route_by_strava_id(route_id).await? {
            tracing::debug!(route_id, local_id = existing.id, "Route already imported");
            return Ok((existing, false));
        }

        let remote = strava.get_route(route_id, access_token).await?;

        let mut missing = Vec::new();
        if remote.id.is_none() {
            missing.push("id");
        }
        if remote.name.is_none() {
            missing.push("name");
        }
        if remote.distance.is_none() {
            missing.push("distance");
        }
        if !missing.is_empty() {
            return Err(AppError::IncompleteRemoteData(missing.join(", ")));
        }

        // Prefer the polyline embedded in the route; fall back to encoding
        // the track stream, and import without a track if both are missing.
        let polyline = match remote.polyline() {
            Some(p) => Some(p.to_string()),
            None => strava.get_route_track(route_id, access_token).await,
        };

        let (route, created) = self
            .db
            .upsert_route_by_strava_id(
                route_id,
                NewRoute {
                    name: remote.name.unwrap_or_default(),
                    distance: remote.distance.unwrap_or_default(),
                    elevation_gain: remote.elevation_gain.unwrap_or_default(),
                    polyline,
                    estimated_moving_time: remote.estimated_moving_time,
                },
            )
            .await?;

        if created {
            tracing::info!(route_id, local_id = route.id, "Route imported");
        } else {
            // A concurrent import won the upsert; theirs is the row of record
            tracing::debug!(route_id, local_id = route.id, "Route import raced, reusing");
        }

        Ok((route, created))
    }
}
