use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, routes::AppState};

const BEARER_PREFIX: &str = "Bearer ";

/// The caller behind a valid `Authorization: Bearer <token>` header
///
/// Rejects with 401 when the header is missing or malformed, when the token does
/// not verify, and when the token's user no longer exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })?;

        let claims = state.tokens.verify(token)?;

        let user = state
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
