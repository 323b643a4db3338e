use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, FieldErrors},
    routes::AppState,
    services::{auth, AccessToken},
};

const MAX_USERNAME_LEN: usize = 150;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

// Request types

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

/// Creates an account
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let username = errors.required_text("username", request.username);
    if username.as_ref().is_some_and(|u| u.chars().count() > MAX_USERNAME_LEN) {
        errors.add(
            "username",
            format!("Ensure this field has no more than {} characters.", MAX_USERNAME_LEN),
        );
    }
    let password = match request.password {
        None => {
            errors.add("password", crate::error::REQUIRED);
            None
        }
        Some(p) if p.is_empty() => {
            errors.add("password", crate::error::BLANK);
            None
        }
        Some(p) => Some(p),
    };

    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::Validation(errors));
    };
    errors.finish()?;

    let password_hash = auth::hash_password(password, state.bcrypt_cost).await?;

    let user = match state.store.create_user(&username, &password_hash).await {
        Ok(user) => user,
        Err(AppError::Conflict(message)) => {
            let mut errors = FieldErrors::new();
            errors.add("username", message);
            return Err(AppError::Validation(errors));
        }
        Err(e) => return Err(e),
    };

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully." })),
    ))
}

/// Exchanges credentials for an access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AccessToken>> {
    let Json(request) = payload?;
    let invalid = || AppError::Unauthorized("Invalid Credentials".to_string());

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(invalid());
    };

    let user = state
        .store
        .find_user_by_username(username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(password, user.password_hash.clone()).await? {
        tracing::info!(username = %user.username, "Rejected login");
        return Err(invalid());
    }

    let token = state.tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(token))
}
