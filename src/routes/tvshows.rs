use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, FieldErrors},
    middleware::AuthUser,
    models::{InvalidChoice, MediaKind, SearchKind, WatchAvailability, TV_GENRES},
    routes::{
        filtered_results, movies::RegionQuery, parse_filter, required_query, results,
        upsert_status, AppState,
    },
    services::{apply_filter, preferences::RECENT_SEARCH_LIMIT, CatalogFilter},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search))
        .route("/search/recent", get(recent_searches).delete(clear_recent_searches))
        .route("/trending", get(trending))
        .route("/top-rated", get(top_rated))
        .route("/preferences", get(preferences).put(update_preferences))
        .route("/preferred", get(preferred))
        .route("/:tvshow_id/recommendations", get(recommendations))
        .route("/:tvshow_id/recommendations/save", post(save_recommendation))
        .route("/:tvshow_id/watch-providers", get(watch_providers))
}

// Request types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopRatedQuery {
    genres: Option<String>,
    min_rating: Option<String>,
    first_air_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRecommendationRequest {
    recommended_tv_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    preferred_genres: Option<Vec<String>>,
}

/// Searches TV shows by name and logs the search
pub async fn search(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = query?;
    let query = required_query(params.query)?;

    tracing::info!(user_id = %user.id, query = %query, "Searching TV shows");
    let shows = state.catalog.search(MediaKind::Tv, &query).await?;

    state
        .store
        .record_search(user.id, SearchKind::Tv, &query)
        .await?;

    Ok(results(shows))
}

pub async fn recent_searches(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let searches = state
        .store
        .recent_searches(user.id, SearchKind::Tv, RECENT_SEARCH_LIMIT)
        .await?;

    let searches: Vec<Value> = searches.iter().map(|s| s.to_json(SearchKind::Tv)).collect();
    Ok(results(searches))
}

pub async fn clear_recent_searches(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let deleted = state.store.clear_searches(user.id, SearchKind::Tv).await?;
    tracing::info!(user_id = %user.id, deleted, "Cleared recent TV show searches");

    let message = if deleted > 0 {
        "Recent TV show searches cleared successfully."
    } else {
        "No recent TV show searches to clear."
    };

    Ok(Json(json!({ "message": message })))
}

/// TV shows trending this week
pub async fn trending(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> AppResult<Json<Value>> {
    let shows = state.catalog.trending(MediaKind::Tv).await?;
    Ok(results(shows))
}

/// Top-rated TV shows, optionally filtered by genre, minimum rating and first air year
pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TopRatedQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = query?;

    let filter = parse_filter(
        MediaKind::Tv,
        params.genres.as_deref(),
        params.min_rating.as_deref(),
        params.first_air_year.as_deref(),
        "first_air_year",
    )?;

    let shows = state.catalog.top_rated(MediaKind::Tv).await?;
    Ok(filtered_results(apply_filter(shows, &filter), MediaKind::Tv))
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(tvshow_id) = path?;

    let shows = state
        .catalog
        .recommendations(MediaKind::Tv, tvshow_id)
        .await?;
    Ok(results(shows))
}

/// Saves a recommendation; repeats return the saved record with 200
pub async fn save_recommendation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SaveRecommendationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Path(tvshow_id) = path?;
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let Some(recommended_tv_id) = errors.required("recommended_tv_id", request.recommended_tv_id)
    else {
        return Err(AppError::Validation(errors));
    };

    let upserted = state
        .store
        .upsert_recommendation_link(user.id, tvshow_id, recommended_tv_id)
        .await?;

    let message = if upserted.created {
        "Recommendation saved."
    } else {
        "Recommendation already saved."
    };

    Ok((
        upsert_status(upserted.created),
        Json(json!({
            "message": message,
            "recommendation": upserted.record,
        })),
    ))
}

pub async fn watch_providers(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<RegionQuery>, QueryRejection>,
) -> AppResult<Json<WatchAvailability>> {
    let Path(tvshow_id) = path?;
    let Query(params) = query?;

    let availability = state
        .catalog
        .watch_providers(MediaKind::Tv, tvshow_id, &params.region())
        .await?;
    Ok(Json(availability))
}

pub async fn preferences(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let genres = state.store.preferred_genres(user.id).await?;
    Ok(Json(json!({ "preferred_genres": genres })))
}

/// Replaces the caller's preferred TV genres
///
/// The valid subset is always saved. Unknown names turn the response into a 400
/// that still reports what was saved.
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<PreferencesRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let Some(requested) = errors.required("preferred_genres", request.preferred_genres) else {
        return Err(AppError::Validation(errors));
    };

    let update = state
        .store
        .replace_preferred_genres(user.id, &requested)
        .await?;

    if update.invalid.is_empty() {
        return Ok(Json(json!({
            "preferred_genres": update.saved,
            "invalid_genres": update.invalid,
        }))
        .into_response());
    }

    for name in &update.invalid {
        errors.add("preferred_genres", InvalidChoice(name.clone()).to_string());
    }

    Ok((
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": errors,
            "preferred_genres": update.saved,
            "invalid_genres": update.invalid,
        })),
    )
        .into_response())
}

/// Top-rated TV shows in the caller's preferred genres
pub async fn preferred(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let genres = state.store.preferred_genres(user.id).await?;

    if genres.is_empty() {
        return Ok(Json(json!({
            "results": [],
            "message": "No preferred genres set.",
        })));
    }

    let filter = CatalogFilter::new(&genres, None, None, &TV_GENRES);
    let shows = state.catalog.top_rated(MediaKind::Tv).await?;

    Ok(filtered_results(apply_filter(shows, &filter), MediaKind::Tv))
}
