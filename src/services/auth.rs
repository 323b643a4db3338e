//! Password hashing and access tokens
//!
//! Passwords are hashed with bcrypt on the blocking pool. Access tokens are
//! HS256 JWTs whose subject is the user's id.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::MAX_TOKEN_TTL_MINUTES,
    error::{AppError, AppResult},
    models::UserRecord,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access: String,
    pub token_type: &'static str,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Signs and verifies access tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::try_minutes(ttl_minutes)
                .unwrap_or_else(|| Duration::minutes(MAX_TOKEN_TTL_MINUTES)),
        }
    }

    pub fn issue(&self, user: &UserRecord) -> AppResult<AccessToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| AppError::Internal("Token lifetime is out of range".to_string()))?
                .timestamp(),
            iat: now.timestamp(),
        };

        let access = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(AccessToken {
            access,
            token_type: "Bearer",
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Rejects bad signatures, malformed tokens and expired tokens
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::Unauthorized("Invalid or expired token.".to_string())
            })
    }
}

pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// A malformed stored hash counts as a mismatch
pub async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?;

    Ok(outcome.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Stored password hash could not be parsed");
        false
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "ripley".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let issuer = TokenIssuer::new("test-secret", 60);
        let user = user();

        let token = assert_ok!(issuer.issue(&user));
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);

        let claims = assert_ok!(issuer.verify(&token.access));
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "ripley");
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = assert_ok!(TokenIssuer::new("one", 60).issue(&user()));
        let err = assert_err!(TokenIssuer::new("two", 60).verify(&token.access));
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", -10);
        let token = assert_ok!(issuer.issue(&user()));
        assert_err!(issuer.verify(&token.access));
    }

    #[test]
    fn test_oversized_ttl_does_not_panic() {
        let issuer = TokenIssuer::new("test-secret", i64::MAX);
        let token = assert_ok!(issuer.issue(&user()));
        assert_eq!(token.expires_in, MAX_TOKEN_TTL_MINUTES * 60);
        assert_ok!(issuer.verify(&token.access));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 60);
        assert_err!(issuer.verify("not.a.jwt"));
    }

    #[tokio::test]
    async fn test_password_round_trip() {
        let hash = assert_ok!(hash_password("hunter22".to_string(), 4).await);
        assert_ne!(hash, "hunter22");

        assert!(assert_ok!(
            verify_password("hunter22".to_string(), hash.clone()).await
        ));
        assert!(!assert_ok!(
            verify_password("wrong".to_string(), hash).await
        ));
        assert!(!assert_ok!(
            verify_password("hunter22".to_string(), "not-a-hash".to_string()).await
        ));
    }
}
