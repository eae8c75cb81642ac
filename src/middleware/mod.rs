// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Request middleware.

pub mod auth;
pub mod security;
