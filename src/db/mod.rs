// SPDX-License-Identifier: MIT
// Copyright 2026 Rideout contributors

//! Database layer.
//!
//! The rest of the application (ride/event CRUD, notifications) lives behind
//! its own ORM; this crate only needs the narrow slice of storage below.

pub mod memory;

pub use memory::MemoryStore;
