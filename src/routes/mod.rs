use std::sync::Arc;

use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, AppResult, FieldErrors},
    middleware::{make_span_with_request_id, request_id_middleware, AuthUser},
    models::{Collection, MediaKind, NewCollectionItem},
    services::{CatalogFilter, FilterOutcome, MetadataProvider, Store, TokenIssuer},
};

pub mod auth;
pub mod movies;
pub mod people;
pub mod tvshows;

/// Shared application state
pub struct AppState {
    pub catalog: Arc<dyn MetadataProvider>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn MetadataProvider>,
        store: Arc<dyn Store>,
        tokens: TokenIssuer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            catalog,
            store,
            tokens,
            bcrypt_cost,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth::router())
        .nest("/movies", movies::router())
        .nest("/tvshows", tvshows::router())
        .nest("/person", people::router())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

// Helpers shared by the resource routers

/// `{"results": [...]}`
pub(crate) fn results<T: Serialize>(items: T) -> Json<Value> {
    Json(json!({ "results": items }))
}

/// Trims the search text and rejects it when empty
pub(crate) fn required_query(query: Option<String>) -> AppResult<String> {
    query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Query parameter is required.".to_string()))
}

/// 201 for a fresh row, 200 when an existing one was returned
pub(crate) fn upsert_status(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

pub(crate) fn filtered_results(outcome: FilterOutcome, kind: MediaKind) -> Json<Value> {
    match outcome {
        FilterOutcome::Matches(items) => results(items),
        FilterOutcome::NoMatches => Json(json!({
            "results": [],
            "message": format!("No {} match the given filters.", kind.plural()),
        })),
    }
}

/// Builds a top-rated filter from raw query values
///
/// Empty values count as unset. `year_field` names the year parameter in error
/// bodies.
pub(crate) fn parse_filter(
    kind: MediaKind,
    genres: Option<&str>,
    min_rating: Option<&str>,
    year: Option<&str>,
    year_field: &str,
) -> AppResult<CatalogFilter> {
    let mut errors = FieldErrors::new();

    let min_rating = match min_rating.map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                errors.add("min_rating", "A valid number is required.");
                None
            }
        },
    };

    let year = match year.map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<i32>() {
            Ok(value) => Some(value),
            Err(_) => {
                errors.add(year_field, "A valid integer is required.");
                None
            }
        },
    };

    errors.finish()?;

    Ok(CatalogFilter::new(
        &split_list(genres),
        min_rating,
        year,
        kind.genres(),
    ))
}

/// Lists one of the caller's collections
pub(crate) async fn list_collection(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
) -> AppResult<Json<Value>> {
    let items = state.store.list_collection(user.id, collection).await?;
    let items: Vec<Value> = items.iter().map(|i| i.to_json(collection)).collect();

    Ok(results(items))
}

/// Removes one entry from the caller's collection, 404 when absent
pub(crate) async fn remove_from_collection(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
    external_id: i64,
) -> AppResult<Json<Value>> {
    let removed = state
        .store
        .remove_collection_item(user.id, collection, external_id)
        .await?;

    if !removed {
        return Err(AppError::NotFound(format!(
            "Item {} is not in your {}.",
            external_id,
            collection.label()
        )));
    }

    tracing::info!(
        user_id = %user.id,
        collection = collection.label(),
        external_id,
        "Removed collection entry"
    );

    Ok(Json(json!({
        "message": format!("Removed from your {}.", collection.label()),
    })))
}

/// Get-or-create in one of the caller's collections
pub(crate) async fn add_to_collection(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
    item: NewCollectionItem,
) -> AppResult<(StatusCode, Json<Value>)> {
    let upserted = state
        .store
        .upsert_collection_item(user.id, collection, item)
        .await?;

    let message = if upserted.created {
        format!("Added to your {}.", collection.label())
    } else {
        format!("Already in your {}.", collection.label())
    };

    tracing::info!(
        user_id = %user.id,
        collection = collection.label(),
        external_id = upserted.record.external_id,
        created = upserted.created,
        "Saved collection entry"
    );

    Ok((
        upsert_status(upserted.created),
        Json(json!({
            "message": message,
            "item": upserted.record.to_json(collection),
        })),
    ))
}

/// Splits a comma-separated query value, dropping empty entries
pub(crate) fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
