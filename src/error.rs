use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::services::providers::UpstreamError;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

/// Field-level validation messages keyed by request field name
///
/// Serializes as `{"field": ["message", ...]}` so it can be dropped straight into
/// an error body.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a "required" error when the value is missing
    pub fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, REQUIRED);
        }
        value
    }

    /// Like [`FieldErrors::required`], but also rejects whitespace-only strings.
    /// The returned text is trimmed.
    pub fn required_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|v| v.trim().to_string()) {
            None => {
                self.add(field, REQUIRED);
                None
            }
            Some(v) if v.is_empty() => {
                self.add(field, BLANK);
                None
            }
            Some(v) => Some(v),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Fails with [`AppError::Validation`] if any error was recorded
    pub fn finish(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(UpstreamError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Validation(errors) => json!({ "error": errors }),
            AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::Unauthorized(msg)
            | AppError::Conflict(msg) => json!({ "error": msg }),
            AppError::Upstream(err) => {
                tracing::warn!(error = %err, "Upstream lookup failed");
                json!({ "error": err.to_string() })
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                json!({ "error": "A database error occurred." })
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                json!({ "error": msg })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_rejects_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.required_text("movie_title", Some("  ".into())), None);
        assert_eq!(errors.required_text("comment", None), None);
        assert_eq!(
            errors.required_text("query", Some(" Alien ".into())),
            Some("Alien".to_string())
        );

        assert_eq!(errors.get("movie_title"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("comment"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("query"), None);
    }

    #[test]
    fn test_finish_without_errors_is_ok() {
        assert!(FieldErrors::new().finish().is_ok());
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("rating", "\"meh\" is not a valid choice.");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, json!({ "rating": ["\"meh\" is not a valid choice."] }));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthorized("no".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Validation(FieldErrors::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upstream(UpstreamError::NotFound("movie/1".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Upstream(UpstreamError::Transport("refused".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_error_is_not_leaked() {
        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
