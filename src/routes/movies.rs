use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, FieldErrors, REQUIRED},
    middleware::{AuthUser, RequestId},
    models::{
        Collection, MediaKind, MovieCredits, NewCollectionItem, NewMovieFeedback, SearchKind,
        Verdict, WatchAvailability,
    },
    routes::{
        add_to_collection, filtered_results, list_collection, parse_filter,
        remove_from_collection, required_query, results, AppState,
    },
    services::{apply_filter, preferences::RECENT_SEARCH_LIMIT},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search))
        .route("/search/save", post(save_search))
        .route("/search/recent", get(recent_searches).delete(clear_recent_searches))
        .route("/trending", get(trending))
        .route("/trending/feedback", post(submit_feedback))
        .route("/top-rated", get(top_rated))
        .route("/top-rated/favorites", post(add_favorite))
        .route("/favorites", get(favorites))
        .route("/favorites/:movie_id", delete(remove_favorite))
        .route("/watchlist", get(watchlist).post(add_to_watchlist))
        .route("/watchlist/:movie_id", delete(remove_from_watchlist))
        .route("/:movie_id/recommendations", get(recommendations))
        .route(
            "/:movie_id/recommendations/feedback",
            post(submit_recommendation_feedback),
        )
        .route("/:movie_id/credits", get(credits))
        .route("/:movie_id/watch-providers", get(watch_providers))
}

// Request types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveSearchRequest {
    movie_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    movie_title: Option<String>,
    /// `like`/`dislike`, or the legacy `1`/`0`, as a string or a number
    rating: Option<Value>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopRatedQuery {
    genres: Option<String>,
    min_rating: Option<String>,
    release_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovieEntryRequest {
    movie_id: Option<i64>,
    movie_title: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationFeedbackRequest {
    recommended_movie_id: Option<i64>,
    feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RegionQuery {
    region: Option<String>,
}

const DEFAULT_REGION: &str = "US";

impl RegionQuery {
    pub(crate) fn region(self) -> String {
        self.region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }
}

/// Parses a verdict given as a JSON string or number, recording field errors
fn verdict_field(errors: &mut FieldErrors, field: &str, raw: Option<Value>) -> Option<Verdict> {
    let text = match raw {
        None | Some(Value::Null) => {
            errors.add(field, REQUIRED);
            return None;
        }
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    };

    match text.parse::<Verdict>() {
        Ok(verdict) => Some(verdict),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

fn movie_entry(request: MovieEntryRequest) -> AppResult<NewCollectionItem> {
    let mut errors = FieldErrors::new();
    let movie_id = errors.required("movie_id", request.movie_id);
    let movie_title = errors.required_text("movie_title", request.movie_title);

    match (movie_id, movie_title) {
        (Some(external_id), Some(display_name)) => Ok(NewCollectionItem {
            external_id,
            display_name,
            image_path: request.poster_path.filter(|p| !p.trim().is_empty()),
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Searches movies by title
pub async fn search(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = query?;
    let query = required_query(params.query)?;

    tracing::info!(user_id = %user.id, query = %query, "Searching movies");
    let movies = state.catalog.search(MediaKind::Movie, &query).await?;

    Ok(results(movies))
}

/// Appends a title to the caller's movie search log
pub async fn save_search(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<SaveSearchRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;

    let title = request
        .movie_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Movie title is required.".to_string()))?;

    let search = state
        .store
        .record_search(user.id, SearchKind::Movie, &title)
        .await?;

    Ok((StatusCode::CREATED, Json(search.to_json(SearchKind::Movie))))
}

pub async fn recent_searches(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let searches = state
        .store
        .recent_searches(user.id, SearchKind::Movie, RECENT_SEARCH_LIMIT)
        .await?;

    let searches: Vec<Value> = searches
        .iter()
        .map(|s| s.to_json(SearchKind::Movie))
        .collect();
    Ok(results(searches))
}

pub async fn clear_recent_searches(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let deleted = state.store.clear_searches(user.id, SearchKind::Movie).await?;

    let message = if deleted > 0 {
        "Recent movie searches cleared successfully."
    } else {
        "No recent movie searches to clear."
    };

    Ok(Json(json!({ "message": message })))
}

/// Movies trending this week
pub async fn trending(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> AppResult<Json<Value>> {
    let movies = state.catalog.trending(MediaKind::Movie).await?;
    Ok(results(movies))
}

/// Records a like/dislike on a trending movie
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let movie_title = errors.required_text("movie_title", request.movie_title);
    let rating = verdict_field(&mut errors, "rating", request.rating);
    let comment = request
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let (Some(movie_title), Some(rating)) = (movie_title, rating) else {
        return Err(AppError::Validation(errors));
    };

    let feedback = state
        .store
        .record_movie_feedback(
            user.id,
            NewMovieFeedback {
                movie_title,
                rating,
                comment,
            },
        )
        .await
        .map_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Failed to save feedback");
            AppError::Internal("Error saving feedback.".to_string())
        })?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user.id,
        rating = %feedback.rating,
        "Movie feedback recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!(
                "Feedback submitted successfully! You {} the movie '{}'.",
                feedback.rating.label(),
                feedback.movie_title
            ),
            "user": user.username,
            "movie_title": feedback.movie_title,
            "rating": feedback.rating.label(),
            "comment": feedback.comment.as_deref().unwrap_or("No comment"),
            "created_at": feedback.created_at,
        })),
    ))
}

/// Top-rated movies, optionally filtered by genre, minimum rating and year
pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TopRatedQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(params) = query?;

    let filter = parse_filter(
        MediaKind::Movie,
        params.genres.as_deref(),
        params.min_rating.as_deref(),
        params.release_year.as_deref(),
        "release_year",
    )?;

    let movies = state.catalog.top_rated(MediaKind::Movie).await?;
    Ok(filtered_results(apply_filter(movies, &filter), MediaKind::Movie))
}

pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<MovieEntryRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let item = movie_entry(request)?;
    add_to_collection(&state, &user, Collection::FavoriteMovies, item).await
}

pub async fn favorites(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    list_collection(&state, &user, Collection::FavoriteMovies).await
}

pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(movie_id) = path?;

    remove_from_collection(&state, &user, Collection::FavoriteMovies, movie_id).await
}

pub async fn watchlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    list_collection(&state, &user, Collection::Watchlist).await
}

pub async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<MovieEntryRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let item = movie_entry(request)?;
    add_to_collection(&state, &user, Collection::Watchlist, item).await
}

pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(movie_id) = path?;

    remove_from_collection(&state, &user, Collection::Watchlist, movie_id).await
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(movie_id) = path?;

    let movies = state
        .catalog
        .recommendations(MediaKind::Movie, movie_id)
        .await?;
    Ok(results(movies))
}

/// Records feedback on one recommendation; a second submission conflicts
pub async fn submit_recommendation_feedback(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecommendationFeedbackRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Path(movie_id) = path?;
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let recommended_movie_id = errors.required("recommended_movie_id", request.recommended_movie_id);
    let feedback = verdict_field(&mut errors, "feedback", request.feedback);

    let (Some(recommended_movie_id), Some(feedback)) = (recommended_movie_id, feedback) else {
        return Err(AppError::Validation(errors));
    };

    let record = state
        .store
        .record_recommendation_feedback(user.id, movie_id, recommended_movie_id, feedback)
        .await?;

    tracing::info!(
        user_id = %user.id,
        movie_id,
        recommended_movie_id,
        feedback = %record.feedback,
        "Recommendation feedback recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Feedback recorded.",
            "feedback": record,
        })),
    ))
}

pub async fn credits(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MovieCredits>> {
    let Path(movie_id) = path?;

    let credits = state.catalog.movie_credits(movie_id).await?;
    Ok(Json(credits))
}

pub async fn watch_providers(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<RegionQuery>, QueryRejection>,
) -> AppResult<Json<WatchAvailability>> {
    let Path(movie_id) = path?;
    let Query(params) = query?;

    let region = params.region();
    let availability = state
        .catalog
        .watch_providers(MediaKind::Movie, movie_id, &region)
        .await?;
    Ok(Json(availability))
}
