// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Actor endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::{
    api::RecordId,
    auth::Auth,
    error::ApiError,
    models::{ActorDeletedResponse, ActorRequest, ActorResponse, ActorsResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/actors",
    tag = "Actors",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ActorsResponse),
        (status = 404, description = "No actors stored"),
    )
)]
pub async fn list_actors(State(state): State<AppState>) -> Result<Json<ActorsResponse>, ApiError> {
    let actors = state.store.read().await.list_actors();
    if actors.is_empty() {
        return Err(ApiError::not_found());
    }
    Ok(Json(ActorsResponse {
        success: true,
        actors,
    }))
}

#[utoipa::path(
    get,
    path = "/actors/{id}",
    params(("id" = u64, Path, description = "Actor id")),
    tag = "Actors",
    security(("bearer" = [])),
    responses((status = 200, body = ActorResponse), (status = 404))
)]
pub async fn get_actor(
    RecordId(id): RecordId,
    State(state): State<AppState>,
) -> Result<Json<ActorResponse>, ApiError> {
    let actor = state.store.read().await.actor(id)?;
    Ok(Json(ActorResponse {
        success: true,
        actor,
    }))
}

#[utoipa::path(
    post,
    path = "/actors",
    request_body = ActorRequest,
    tag = "Actors",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ActorResponse),
        (status = 400),
        (status = 422, description = "Referenced movie does not exist"),
    )
)]
pub async fn create_actor(
    Auth(identity): Auth,
    State(state): State<AppState>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> Result<Json<ActorResponse>, ApiError> {
    let Json(request) = payload?;
    let actor = state.store.write().await.create_actor(request)?;

    info!(actor_id = actor.id, subject = %identity.subject, "Actor created");
    Ok(Json(ActorResponse {
        success: true,
        actor,
    }))
}

#[utoipa::path(
    patch,
    path = "/actors/{id}",
    params(("id" = u64, Path, description = "Actor id")),
    request_body = ActorRequest,
    tag = "Actors",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ActorResponse),
        (status = 400),
        (status = 404),
        (status = 422, description = "Referenced movie does not exist"),
    )
)]
pub async fn update_actor(
    Auth(identity): Auth,
    RecordId(id): RecordId,
    State(state): State<AppState>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> Result<Json<ActorResponse>, ApiError> {
    let Json(request) = payload?;
    let actor = state.store.write().await.update_actor(id, request)?;

    info!(actor_id = actor.id, subject = %identity.subject, "Actor updated");
    Ok(Json(ActorResponse {
        success: true,
        actor,
    }))
}

#[utoipa::path(
    delete,
    path = "/actors/{id}",
    params(("id" = u64, Path, description = "Actor id")),
    tag = "Actors",
    security(("bearer" = [])),
    responses((status = 200, body = ActorDeletedResponse), (status = 404))
)]
pub async fn delete_actor(
    Auth(identity): Auth,
    RecordId(id): RecordId,
    State(state): State<AppState>,
) -> Result<Json<ActorDeletedResponse>, ApiError> {
    let actor = state.store.write().await.delete_actor(id)?;

    info!(actor_id = actor.id, subject = %identity.subject, "Actor deleted");
    Ok(Json(ActorDeletedResponse {
        success: true,
        deleted: actor.id,
        name: actor.name,
    }))
}
