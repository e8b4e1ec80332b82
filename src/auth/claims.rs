// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified token claims and the identity handed to protected handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AuthError;

/// Audience claim, which may be a single string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Audience {
    One(String),
    Many(Vec<String>),
}

/// Token payload fields kept after verification.
///
/// Registered claims are optional here: their presence and values are
/// checked by the validation pass, which runs after this payload has been
/// deserialized. `iss`, `exp` and `nbf` are never read back.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Claims of a token that passed signature, expiry, issuer and audience
/// checks. Only the verifier produces these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    subject: String,
    audience: Vec<String>,
    permissions: Option<Vec<String>>,
}

impl TryFrom<RawClaims> for ClaimSet {
    type Error = AuthError;

    /// Fails with `InvalidClaims` when `sub` or `aud` is absent.
    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let subject = raw.sub.ok_or(AuthError::InvalidClaims)?;
        let audience = match raw.aud.ok_or(AuthError::InvalidClaims)? {
            Audience::One(aud) => vec![aud],
            Audience::Many(auds) => auds,
        };
        Ok(Self {
            subject,
            audience,
            permissions: raw.permissions,
        })
    }
}

impl ClaimSet {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// Granted permissions; empty when the token carried none.
    pub fn permissions(&self) -> &[String] {
        self.permissions.as_deref().unwrap_or_default()
    }

    /// Whether the token carried a `permissions` claim at all.
    pub fn has_permissions_claim(&self) -> bool {
        self.permissions.is_some()
    }

    pub(crate) fn into_identity(self) -> Identity {
        Identity {
            subject: self.subject,
            permissions: self.permissions.unwrap_or_default(),
        }
    }
}

/// The caller behind an authorized request.
///
/// Stored in request extensions by the permission guard and read by the
/// `Auth` extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    /// Token subject
    pub subject: String,
    /// Permissions granted by the token, in token order
    pub permissions: Vec<String>,
}

impl Identity {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn claims_from(payload: serde_json::Value) -> ClaimSet {
        let raw: RawClaims = serde_json::from_value(payload).unwrap();
        ClaimSet::try_from(raw).unwrap()
    }

    #[test]
    fn single_audience_becomes_list() {
        let claims = claims_from(json!({
            "sub": "auth0|123", "iss": "https://tenant/", "aud": "casting", "exp": 1
        }));
        assert_eq!(claims.audience(), ["casting".to_string()]);
    }

    #[test]
    fn audience_list_is_kept() {
        let claims = claims_from(json!({
            "sub": "auth0|123", "iss": "https://tenant/", "aud": ["casting", "userinfo"], "exp": 1
        }));
        assert_eq!(claims.audience().len(), 2);
    }

    #[test]
    fn absent_permissions_read_as_empty_but_are_distinguishable() {
        let claims = claims_from(json!({
            "sub": "auth0|123", "iss": "https://tenant/", "aud": "casting", "exp": 1
        }));
        assert!(claims.permissions().is_empty());
        assert!(!claims.has_permissions_claim());

        let claims = claims_from(json!({
            "sub": "auth0|123", "iss": "https://tenant/", "aud": "casting", "exp": 1,
            "permissions": []
        }));
        assert!(claims.permissions().is_empty());
        assert!(claims.has_permissions_claim());
    }

    #[test]
    fn payload_without_registered_claims_still_deserializes() {
        let raw: RawClaims = serde_json::from_value(json!({"permissions": []})).unwrap();
        assert!(raw.sub.is_none());
        assert!(matches!(ClaimSet::try_from(raw), Err(AuthError::InvalidClaims)));
    }

    #[test]
    fn missing_audience_is_invalid_claims() {
        let raw: RawClaims = serde_json::from_value(json!({"sub": "auth0|123"})).unwrap();
        assert!(matches!(ClaimSet::try_from(raw), Err(AuthError::InvalidClaims)));
    }

    #[test]
    fn identity_keeps_subject_and_permissions() {
        let identity = claims_from(json!({
            "sub": "auth0|123", "iss": "https://tenant/", "aud": "casting", "exp": 1,
            "permissions": ["view:movies", "view:actors"]
        }))
        .into_identity();

        assert_eq!(identity.subject, "auth0|123");
        assert_eq!(identity.permissions, ["view:movies", "view:actors"]);
        assert!(identity.has_permission("view:actors"));
        assert!(!identity.has_permission("post:actors"));
    }
}
