// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Imported route model.

use serde::{Deserialize, Serialize};

/// A cycling route, typically imported from Strava.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Local route ID
    pub id: i64,
    /// Strava route ID, unique when present
    pub strava_route_id: Option<u64>,
    /// RideWithGPS route ID, unique when present
    pub rwgps_route_id: Option<u64>,
    /// Route name
    pub name: String,
    /// Distance in meters
    pub distance: f64,
    /// Elevation gain in meters
    pub elevation_gain: f64,
    /// Encoded polyline of the track
    pub polyline: Option<String>,
    /// Estimated moving time in seconds
    pub estimated_moving_time: Option<u64>,
    /// When the route was imported (RFC 3339)
    pub created_at: String,
}

/// Fields for creating a route.
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub name: String,
    pub distance: f64,
    pub elevation_gain: f64,
    pub polyline: Option<String>,
    pub estimated_moving_time: Option<u64>,
}
