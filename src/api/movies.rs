// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Movie endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::{
    api::RecordId,
    auth::Auth,
    error::ApiError,
    models::{MovieDeletedResponse, MovieRequest, MovieResponse, MoviesResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/movies",
    tag = "Movies",
    security(("bearer" = [])),
    responses(
        (status = 200, body = MoviesResponse),
        (status = 404, description = "No movies stored"),
    )
)]
pub async fn list_movies(State(state): State<AppState>) -> Result<Json<MoviesResponse>, ApiError> {
    let movies = state.store.read().await.list_movies();
    if movies.is_empty() {
        return Err(ApiError::not_found());
    }
    Ok(Json(MoviesResponse {
        success: true,
        movies,
    }))
}

#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = u64, Path, description = "Movie id")),
    tag = "Movies",
    security(("bearer" = [])),
    responses((status = 200, body = MovieResponse), (status = 404))
)]
pub async fn get_movie(
    RecordId(id): RecordId,
    State(state): State<AppState>,
) -> Result<Json<MovieResponse>, ApiError> {
    let movie = state.store.read().await.movie(id)?;
    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

#[utoipa::path(
    post,
    path = "/movies",
    request_body = MovieRequest,
    tag = "Movies",
    security(("bearer" = [])),
    responses((status = 200, body = MovieResponse), (status = 400))
)]
pub async fn create_movie(
    Auth(identity): Auth,
    State(state): State<AppState>,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let Json(request) = payload?;
    let movie = state.store.write().await.create_movie(request)?;

    info!(movie_id = movie.id, subject = %identity.subject, "Movie created");
    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

#[utoipa::path(
    patch,
    path = "/movies/{id}",
    params(("id" = u64, Path, description = "Movie id")),
    request_body = MovieRequest,
    tag = "Movies",
    security(("bearer" = [])),
    responses((status = 200, body = MovieResponse), (status = 400), (status = 404))
)]
pub async fn update_movie(
    Auth(identity): Auth,
    RecordId(id): RecordId,
    State(state): State<AppState>,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let Json(request) = payload?;
    let movie = state.store.write().await.update_movie(id, request)?;

    info!(movie_id = movie.id, subject = %identity.subject, "Movie updated");
    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

#[utoipa::path(
    delete,
    path = "/movies/{id}",
    params(("id" = u64, Path, description = "Movie id")),
    tag = "Movies",
    security(("bearer" = [])),
    responses(
        (status = 200, body = MovieDeletedResponse),
        (status = 404),
        (status = 422, description = "Actors are still cast in this movie"),
    )
)]
pub async fn delete_movie(
    Auth(identity): Auth,
    RecordId(id): RecordId,
    State(state): State<AppState>,
) -> Result<Json<MovieDeletedResponse>, ApiError> {
    let movie = state.store.write().await.delete_movie(id)?;

    info!(movie_id = movie.id, subject = %identity.subject, "Movie deleted");
    Ok(Json(MovieDeletedResponse {
        success: true,
        deleted: movie.id,
        title: movie.title,
    }))
}
