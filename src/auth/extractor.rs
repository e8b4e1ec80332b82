// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token parsing and the axum extractor for authorized callers.
//!
//! Use the `Auth` extractor in handlers behind a permission guard:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is the verified caller
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue},
};

use tracing::error;

use super::error::BEARER_EXPECTED;
use super::{AuthError, Identity};
use crate::error::ApiError;

/// Pull the raw token out of an `Authorization` header value.
///
/// The header must be exactly two whitespace-separated parts, the first
/// being `Bearer` in any case. The token is returned as-is.
///
/// # Errors
/// - `MissingAuthHeader` if there is no header
/// - `InvalidHeader` for any other shape
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader(BEARER_EXPECTED))?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::InvalidHeader(BEARER_EXPECTED)),
    }
}

/// Extractor for the caller identity established by the permission guard.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_movie(
///     Auth(identity): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<MovieResponse>, ApiError> {
///     // identity.subject is the token subject
/// }
/// ```
#[derive(Debug)]
pub struct Auth(pub Identity);

/// A handler using `Auth` on a route without a permission guard is a
/// wiring error, so the rejection is a 500 rather than an auth failure.
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(Auth(identity.clone())),
            None => {
                error!(path = %parts.uri.path(), "No identity on request, permission guard missing");
                Err(ApiError::internal())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parse(raw: &'static str) -> Result<String, AuthError> {
        let header = HeaderValue::from_static(raw);
        bearer_token(Some(&header)).map(str::to_owned)
    }

    #[test]
    fn absent_header_is_missing() {
        let err = bearer_token(None).unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthHeader));
        assert_eq!(err.error_code(), "missing_authorization_header");
    }

    #[test]
    fn bearer_token_is_returned_unmodified() {
        assert_eq!(parse("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(parse("bearer tok").unwrap(), "tok");
        assert_eq!(parse("BEARER tok").unwrap(), "tok");
    }

    #[test]
    fn wrong_part_count_is_invalid() {
        for raw in ["", "Bearer", "abc.def.ghi", "Bearer a b", "Bearer a b c"] {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.error_code(), "invalid_header", "{raw:?}");
        }
    }

    #[test]
    fn other_schemes_are_invalid() {
        for raw in ["Basic dXNlcjpwYXNz", "Token abc", "Bearertok x"] {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.error_code(), "invalid_header", "{raw:?}");
        }
    }

    #[test]
    fn non_ascii_header_is_invalid() {
        let header = HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap();
        let err = bearer_token(Some(&header)).unwrap_err();
        assert_eq!(err.error_code(), "invalid_header");
    }

    #[tokio::test]
    async fn auth_extractor_reads_guard_identity() {
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        parts.extensions.insert(Identity {
            subject: "auth0|producer".to_string(),
            permissions: vec!["delete:movies".to_string()],
        });

        let Auth(identity) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.subject, "auth0|producer");
    }

    #[tokio::test]
    async fn auth_extractor_rejects_unguarded_request() {
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        let err = Auth::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An error has occured, please try again");
    }
}
