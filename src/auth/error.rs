// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization failures.
//!
//! Every failure is built once where it is detected and travels unchanged to
//! the response boundary, where it renders as
//! `{"success": false, "error": <status>, "code": <code>, "message": <text>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authorization failure raised by the bearer-token pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header on the request
    #[error("Authorization header is expected.")]
    MissingAuthHeader,
    /// Malformed header, unsupported algorithm, missing `kid`, or an
    /// undecodable token
    #[error("{0}")]
    InvalidHeader(&'static str),
    /// The key set has no key with the token's `kid`, even after a refresh
    #[error("Unable to find the appropriate key.")]
    NoMatchingKey,
    /// The key set endpoint could not be reached or returned garbage
    #[error("Unable to fetch signing keys: {0}")]
    JwksUnavailable(String),
    /// Signature does not verify against the resolved key
    #[error("Token signature is invalid.")]
    InvalidSignature,
    /// `exp` is in the past
    #[error("Token expired.")]
    TokenExpired,
    /// Issuer, audience, or not-before check failed
    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,
    /// Claims verified but carry no `permissions` field
    #[error("Permissions not included in JWT.")]
    MissingPermissions,
    /// The granted permissions do not include the required one
    #[error("Permission not found.")]
    Unauthorized,
}

/// `InvalidHeader` descriptions.
pub const BEARER_EXPECTED: &str = "Authorization header must be bearer token.";
pub const UNSUPPORTED_ALGORITHM: &str = "Token algorithm is not accepted.";
pub const MISSING_KEY_ID: &str = "Authorization malformed.";
pub const UNPARSABLE_TOKEN: &str = "Unable to parse authentication token.";

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: u16,
    code: &'static str,
    message: String,
}

impl AuthError {
    /// Machine-readable code for this failure.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_authorization_header",
            AuthError::InvalidHeader(_) => "invalid_header",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::JwksUnavailable(_) => "jwks_unavailable",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims | AuthError::MissingPermissions => "invalid_claims",
            AuthError::Unauthorized => "unauthorized",
        }
    }

    /// HTTP status carried by this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidHeader(_)
            | AuthError::NoMatchingKey
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidClaims => StatusCode::UNAUTHORIZED,
            AuthError::MissingPermissions => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
            AuthError::JwksUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            error: status.as_u16(),
            code: self.error_code(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: AuthError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_header_renders_uniform_shape() {
        let (status, body) = body_of(AuthError::MissingAuthHeader).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 401);
        assert_eq!(body["code"], "missing_authorization_header");
        assert_eq!(body["message"], "Authorization header is expected.");
    }

    #[tokio::test]
    async fn unauthorized_returns_403() {
        let (status, body) = body_of(AuthError::Unauthorized).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], 403);
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn missing_permissions_is_400_invalid_claims() {
        let (status, body) = body_of(AuthError::MissingPermissions).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_claims");
    }

    #[test]
    fn only_key_fetch_failures_are_server_side() {
        let caller_side = [
            AuthError::MissingAuthHeader,
            AuthError::InvalidHeader(BEARER_EXPECTED),
            AuthError::NoMatchingKey,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::InvalidClaims,
            AuthError::MissingPermissions,
            AuthError::Unauthorized,
        ];
        for error in caller_side {
            assert!(error.status_code().is_client_error(), "{error:?}");
        }
        assert_eq!(
            AuthError::JwksUnavailable("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_header_displays_its_reason() {
        assert_eq!(
            AuthError::InvalidHeader(MISSING_KEY_ID).to_string(),
            "Authorization malformed."
        );
    }
}
