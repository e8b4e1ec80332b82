// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response data structures used by the REST API. All types
//! derive `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Movies**: titles with a release date
//! - **Actors**: cast members, each attached to one movie
//!
//! Request bodies use optional fields so a missing field surfaces as a
//! uniform 400 instead of a deserializer rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type MovieId = u64;
pub type ActorId = u64;

// =============================================================================
// Movie Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub release_date: NaiveDate,
}

/// Body of `POST /movies` and `PATCH /movies/{id}`. Both fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MovieRequest {
    pub title: Option<String>,
    /// ISO-8601 date, e.g. `2020-04-20`
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MoviesResponse {
    pub success: bool,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovieResponse {
    pub success: bool,
    pub movie: Movie,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovieDeletedResponse {
    pub success: bool,
    pub deleted: MovieId,
    pub title: String,
}

// =============================================================================
// Actor Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// The movie this actor is cast in.
    pub movie_id: MovieId,
}

/// Body of `POST /actors` and `PATCH /actors/{id}`. All fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ActorRequest {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub movie_id: Option<MovieId>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActorsResponse {
    pub success: bool,
    pub actors: Vec<Actor>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActorResponse {
    pub success: bool,
    pub actor: Actor,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActorDeletedResponse {
    pub success: bool,
    pub deleted: ActorId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_release_date_is_iso() {
        let movie = Movie {
            id: 1,
            title: "The Platform".into(),
            release_date: NaiveDate::from_ymd_opt(2020, 4, 20).unwrap(),
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["release_date"], "2020-04-20");
    }

    #[test]
    fn request_fields_may_be_absent() {
        let request: ActorRequest = serde_json::from_str(r#"{"name":"Postman"}"#).unwrap();
        assert_eq!(request.name.as_deref(), Some("Postman"));
        assert!(request.movie_id.is_none());
    }
}
