// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory record store for movies and actors.
//!
//! Ids are assigned sequentially from 1 and never reused. An actor always
//! points at an existing movie; a movie with actors cannot be deleted.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::models::{Actor, ActorId, ActorRequest, Movie, MovieId, MovieRequest};

#[derive(Default)]
pub struct InMemoryStore {
    movies: BTreeMap<MovieId, Movie>,
    actors: BTreeMap<ActorId, Actor>,
    last_movie_id: MovieId,
    last_actor_id: ActorId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_movies(&self) -> Vec<Movie> {
        self.movies.values().cloned().collect()
    }

    pub fn movie(&self, id: MovieId) -> Result<Movie, ApiError> {
        self.movies.get(&id).cloned().ok_or_else(ApiError::not_found)
    }

    pub fn create_movie(&mut self, request: MovieRequest) -> Result<Movie, ApiError> {
        let (title, release_date) = movie_fields(request)?;

        let id = self.last_movie_id.checked_add(1).ok_or_else(ApiError::internal)?;
        self.last_movie_id = id;
        let movie = Movie {
            id,
            title,
            release_date,
        };
        self.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    pub fn update_movie(&mut self, id: MovieId, request: MovieRequest) -> Result<Movie, ApiError> {
        let Some(movie) = self.movies.get_mut(&id) else {
            return Err(ApiError::not_found());
        };
        let (title, release_date) = movie_fields(request)?;

        movie.title = title;
        movie.release_date = release_date;
        Ok(movie.clone())
    }

    pub fn delete_movie(&mut self, id: MovieId) -> Result<Movie, ApiError> {
        if !self.movies.contains_key(&id) {
            return Err(ApiError::not_found());
        }
        if self.actors.values().any(|actor| actor.movie_id == id) {
            return Err(ApiError::unprocessable());
        }
        self.movies.remove(&id).ok_or_else(ApiError::not_found)
    }

    pub fn list_actors(&self) -> Vec<Actor> {
        self.actors.values().cloned().collect()
    }

    pub fn actor(&self, id: ActorId) -> Result<Actor, ApiError> {
        self.actors.get(&id).cloned().ok_or_else(ApiError::not_found)
    }

    pub fn create_actor(&mut self, request: ActorRequest) -> Result<Actor, ApiError> {
        let fields = actor_fields(request)?;
        self.ensure_movie(fields.movie_id)?;

        let id = self.last_actor_id.checked_add(1).ok_or_else(ApiError::internal)?;
        self.last_actor_id = id;
        let actor = Actor {
            id,
            name: fields.name,
            age: fields.age,
            gender: fields.gender,
            movie_id: fields.movie_id,
        };
        self.actors.insert(actor.id, actor.clone());
        Ok(actor)
    }

    pub fn update_actor(&mut self, id: ActorId, request: ActorRequest) -> Result<Actor, ApiError> {
        if !self.actors.contains_key(&id) {
            return Err(ApiError::not_found());
        }
        let fields = actor_fields(request)?;
        self.ensure_movie(fields.movie_id)?;

        let actor = self.actors.get_mut(&id).ok_or_else(ApiError::not_found)?;
        actor.name = fields.name;
        actor.age = fields.age;
        actor.gender = fields.gender;
        actor.movie_id = fields.movie_id;
        Ok(actor.clone())
    }

    pub fn delete_actor(&mut self, id: ActorId) -> Result<Actor, ApiError> {
        self.actors.remove(&id).ok_or_else(ApiError::not_found)
    }

    fn ensure_movie(&self, id: MovieId) -> Result<(), ApiError> {
        if self.movies.contains_key(&id) {
            Ok(())
        } else {
            Err(ApiError::unprocessable())
        }
    }
}

struct ActorFields {
    name: String,
    age: u32,
    gender: String,
    movie_id: MovieId,
}

fn movie_fields(request: MovieRequest) -> Result<(String, chrono::NaiveDate), ApiError> {
    match (request.title, request.release_date) {
        (Some(title), Some(release_date)) => Ok((title, release_date)),
        _ => Err(ApiError::bad_request()),
    }
}

fn actor_fields(request: ActorRequest) -> Result<ActorFields, ApiError> {
    match (request.name, request.age, request.gender, request.movie_id) {
        (Some(name), Some(age), Some(gender), Some(movie_id)) => Ok(ActorFields {
            name,
            age,
            gender,
            movie_id,
        }),
        _ => Err(ApiError::bad_request()),
    }
}
