use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    middleware::AuthUser,
    models::{Collection, NewCollectionItem, PersonFilmography},
    routes::{
        add_to_collection, list_collection, remove_from_collection, required_query, results,
        AppState,
    },
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search))
        .route("/favorites", get(favorites))
        .route("/:person_id/movies", get(movies))
        .route("/:person_id/favorite", post(add_favorite))
        .route("/:person_id/movies/remove", delete(remove_favorite))
}

// Request types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteActorRequest {
    actor_name: Option<String>,
    profile_path: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = query?;
    let query = required_query(params.query)?;

    tracing::info!(user_id = %user.id, query = %query, "Searching people");
    let people = state.catalog.search_people(&query).await?;

    Ok(results(people))
}

/// A person and the movies they acted in
pub async fn movies(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<PersonFilmography>> {
    let Path(person_id) = path?;

    let filmography = state.catalog.person_movies(person_id).await?;
    Ok(Json(filmography))
}

pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<FavoriteActorRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Path(person_id) = path?;
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let Some(actor_name) = errors.required_text("actor_name", request.actor_name) else {
        return Err(AppError::Validation(errors));
    };

    let item = NewCollectionItem {
        external_id: person_id,
        display_name: actor_name,
        image_path: request.profile_path.filter(|p| !p.trim().is_empty()),
    };

    add_to_collection(&state, &user, Collection::FavoriteActors, item).await
}

pub async fn favorites(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    list_collection(&state, &user, Collection::FavoriteActors).await
}

pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(person_id) = path?;

    remove_from_collection(&state, &user, Collection::FavoriteActors, person_id).await
}
