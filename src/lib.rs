// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Casting Agency - Movies & Actors API
//!
//! Records API whose protected routes are guarded by bearer tokens issued by
//! an external identity provider. Tokens are verified against the provider's
//! JWKS and must carry the permission each route requires.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification, JWKS cache and permission checks
//! - `store` - In-memory movie and actor records

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
