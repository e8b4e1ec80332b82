// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate and its route middleware.
//!
//! Each protected route is registered with the single permission it needs:
//!
//! ```rust,ignore
//! let guard = |permission| {
//!     axum::middleware::from_fn_with_state(
//!         PermissionGuard::new(gate.clone(), permission),
//!         require_permission::<HttpKeySource>,
//!     )
//! };
//!
//! Router::new().route("/movies", get(list_movies).route_layer(guard(VIEW_MOVIES)));
//! ```
//!
//! The guard runs the bearer pipeline, stores the caller's `Identity` in the
//! request extensions and hands over to the handler. Handler errors pass
//! through untouched.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::extractor::bearer_token;
use super::jwks::{HttpKeySource, KeySource};
use super::permissions::enforce;
use super::verifier::TokenVerifier;
use super::{AuthError, Identity};

/// Runs header parsing, token verification and permission enforcement.
pub struct AuthGate<S = HttpKeySource> {
    verifier: TokenVerifier<S>,
}

impl<S> Clone for AuthGate<S> {
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
        }
    }
}

impl<S: KeySource> AuthGate<S> {
    pub fn new(verifier: TokenVerifier<S>) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &TokenVerifier<S> {
        &self.verifier
    }

    /// Authorize a request carrying `header` for `permission`.
    ///
    /// # Errors
    /// The first failure of the pipeline, unchanged.
    pub async fn authorize(
        &self,
        header: Option<&HeaderValue>,
        permission: &str,
    ) -> Result<Identity, AuthError> {
        let token = bearer_token(header)?;
        let claims = self.verifier.verify(token).await?;
        enforce(claims, permission)
    }
}

/// Middleware state: the gate plus the permission bound at registration.
pub struct PermissionGuard<S = HttpKeySource> {
    gate: AuthGate<S>,
    permission: &'static str,
}

impl<S> Clone for PermissionGuard<S> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            permission: self.permission,
        }
    }
}

impl<S> PermissionGuard<S> {
    pub fn new(gate: AuthGate<S>, permission: &'static str) -> Self {
        Self { gate, permission }
    }

    pub fn permission(&self) -> &'static str {
        self.permission
    }
}

/// Authorization middleware function.
pub async fn require_permission<S: KeySource>(
    State(guard): State<PermissionGuard<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = guard
        .gate
        .authorize(request.headers().get(AUTHORIZATION), guard.permission)
        .await;

    match outcome {
        Ok(identity) => {
            debug!(subject = %identity.subject, permission = guard.permission, "Request authorized");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                warn!(code = e.error_code(), error = %e, "Authorization unavailable");
            } else {
                debug!(code = e.error_code(), permission = guard.permission, "Request rejected");
            }
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::JwksManager;
    use crate::auth::verifier::VerifierSettings;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use jsonwebtoken::jwk::JwkSet;
    use tower::ServiceExt;

    struct NoKeys;

    impl KeySource for NoKeys {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Ok(JwkSet { keys: Vec::new() })
        }
    }

    fn gate() -> AuthGate<NoKeys> {
        AuthGate::new(TokenVerifier::new(
            JwksManager::new(NoKeys),
            VerifierSettings::new("https://tenant.auth0.com/", "casting"),
        ))
    }

    #[tokio::test]
    async fn authorize_stops_at_header() {
        let err = gate().authorize(None, "view:movies").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthHeader));
    }

    #[tokio::test]
    async fn guard_short_circuits_before_handler() {
        let app = Router::new().route(
            "/movies",
            get(|| async { "reached" }).route_layer(from_fn_with_state(
                PermissionGuard::new(gate(), "view:movies"),
                require_permission::<NoKeys>,
            )),
        );

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/movies")
                    .header(AUTHORIZATION, "Token abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn guard_keeps_permission() {
        let guard = PermissionGuard::new(gate(), "patch:actors");
        assert_eq!(guard.clone().permission(), "patch:actors");
    }
}
