// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Bearer-token authorization for the Casting Agency API.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with the identity provider (Auth0)
//! 2. Client sends `Authorization: Bearer <JWT>`
//! 3. Server:
//!    - Parses the header into a raw token
//!    - Resolves the signing key by `kid` from the cached JWKS
//!    - Verifies signature, expiry, issuer, audience
//!    - Checks the route's permission against the `permissions` claim
//!    - Passes the caller's `Identity` to the handler
//!
//! ## Security
//!
//! - Only the configured asymmetric algorithm is accepted
//! - JWKS is cached with a TTL and never served past it
//! - No clock skew tolerance unless configured

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

pub use claims::{ClaimSet, Identity};
pub use error::AuthError;
pub use extractor::Auth;
pub use gate::{require_permission, AuthGate, PermissionGuard};
pub use jwks::{HttpKeySource, JwksManager, KeySource, SigningKey};
pub use verifier::{TokenVerifier, VerifierSettings};
