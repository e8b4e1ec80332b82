// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission names and enforcement.
//!
//! ## Permissions
//!
//! Each protected route requires exactly one of these, granted through the
//! token's `permissions` claim:
//!
//! - `view:movies`, `post:movies`, `patch:movies`, `delete:movies`
//! - `view:actors`, `post:actors`, `patch:actors`, `delete:actors`

use super::{AuthError, ClaimSet, Identity};

pub const VIEW_MOVIES: &str = "view:movies";
pub const POST_MOVIES: &str = "post:movies";
pub const PATCH_MOVIES: &str = "patch:movies";
pub const DELETE_MOVIES: &str = "delete:movies";

pub const VIEW_ACTORS: &str = "view:actors";
pub const POST_ACTORS: &str = "post:actors";
pub const PATCH_ACTORS: &str = "patch:actors";
pub const DELETE_ACTORS: &str = "delete:actors";

/// Check that `claims` grant `required` and hand back the caller's identity.
///
/// # Errors
/// - `MissingPermissions` (400) if the token has no `permissions` claim
/// - `Unauthorized` (403) if the claim lacks `required`
pub fn enforce(claims: ClaimSet, required: &str) -> Result<Identity, AuthError> {
    if !claims.has_permissions_claim() {
        return Err(AuthError::MissingPermissions);
    }

    if !claims.permissions().iter().any(|p| p == required) {
        return Err(AuthError::Unauthorized);
    }

    Ok(claims.into_identity())
}
