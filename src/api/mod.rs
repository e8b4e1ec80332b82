// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{FromRequestParts, Path},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use serde::Deserialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{permissions::*, require_permission, HttpKeySource, Identity, PermissionGuard},
    error::ApiError,
    models::{
        Actor, ActorDeletedResponse, ActorRequest, ActorResponse, ActorsResponse, Movie,
        MovieDeletedResponse, MovieRequest, MovieResponse, MoviesResponse,
    },
    state::AppState,
};

pub mod actors;
pub mod health;
pub mod movies;

pub fn router(state: AppState) -> Router {
    let gate = state.gate.clone();
    let guard = |permission: &'static str| {
        from_fn_with_state(
            PermissionGuard::new(gate.clone(), permission),
            require_permission::<HttpKeySource>,
        )
    };

    let routes = Router::new()
        .route("/", get(index))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/movies",
            get(movies::list_movies).route_layer(guard(VIEW_MOVIES)),
        )
        .route(
            "/movies",
            post(movies::create_movie).route_layer(guard(POST_MOVIES)),
        )
        .route(
            "/movies/{id}",
            get(movies::get_movie).route_layer(guard(VIEW_MOVIES)),
        )
        .route(
            "/movies/{id}",
            patch(movies::update_movie).route_layer(guard(PATCH_MOVIES)),
        )
        .route(
            "/movies/{id}",
            delete(movies::delete_movie).route_layer(guard(DELETE_MOVIES)),
        )
        .route(
            "/actors",
            get(actors::list_actors).route_layer(guard(VIEW_ACTORS)),
        )
        .route(
            "/actors",
            post(actors::create_actor).route_layer(guard(POST_ACTORS)),
        )
        .route(
            "/actors/{id}",
            get(actors::get_actor).route_layer(guard(VIEW_ACTORS)),
        )
        .route(
            "/actors/{id}",
            patch(actors::update_actor).route_layer(guard(PATCH_ACTORS)),
        )
        .route(
            "/actors/{id}",
            delete(actors::delete_actor).route_layer(guard(DELETE_ACTORS)),
        )
        .fallback(not_found)
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Numeric record id from the path. Anything else is a uniform 404.
#[derive(Debug, Deserialize, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct RecordId(pub u64);

async fn index() -> &'static str {
    "Casting Agency API"
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        movies::list_movies,
        movies::get_movie,
        movies::create_movie,
        movies::update_movie,
        movies::delete_movie,
        actors::list_actors,
        actors::get_actor,
        actors::create_actor,
        actors::update_actor,
        actors::delete_actor
    ),
    components(
        schemas(
            Movie,
            MovieRequest,
            MoviesResponse,
            MovieResponse,
            MovieDeletedResponse,
            Actor,
            ActorRequest,
            ActorsResponse,
            ActorResponse,
            ActorDeletedResponse,
            Identity,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Movies", description = "Movie records"),
        (name = "Actors", description = "Actor records")
    )
)]
struct ApiDoc;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::{AuthGate, JwksManager, TokenVerifier, VerifierSettings};
    use crate::store::InMemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tower::ServiceExt;

    /// State whose key source points at a closed local port.
    pub(crate) fn test_state() -> AppState {
        let source = HttpKeySource::new("http://127.0.0.1:1/.well-known/jwks.json", Duration::from_millis(200))
            .expect("http client builds");
        let jwks = JwksManager::new(source).with_fetch_timeout(Duration::from_millis(200));
        let settings = VerifierSettings::new("https://casting.test/", "casting");
        AppState::new(InMemoryStore::new(), AuthGate::new(TokenVerifier::new(jwks, settings)))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn index_is_public() {
        let response = router(test_state())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_uses_uniform_error() {
        let (status, body) = send(Request::get("/nowhere").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 404);
        assert_eq!(body["message"], "Resource Not Found");
    }

    #[tokio::test]
    async fn non_numeric_id_is_not_found() {
        let state = test_state();
        let app = Router::new()
            .route("/movies/{id}", get(|RecordId(id): RecordId| async move { id.to_string() }))
            .with_state(state);
        let response = app
            .oneshot(Request::get("/movies/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn guarded_route_requires_header() {
        let (status, body) = send(Request::get("/movies").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "missing_authorization_header");
    }

    #[tokio::test]
    async fn every_mutation_is_guarded() {
        for (method, uri) in [
            ("POST", "/movies"),
            ("PATCH", "/movies/1"),
            ("DELETE", "/movies/1"),
            ("GET", "/actors/1"),
            ("POST", "/actors"),
            ("PATCH", "/actors/1"),
            ("DELETE", "/actors/1"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn openapi_lists_guarded_paths() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/movies/{id}"]["patch"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
