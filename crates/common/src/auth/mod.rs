//! Authentication utilities
//!
//! Provides:
//! - JWT validation of access tokens issued by the auth platform
//! - Token minting for tests and local tooling
//! - Caller context extraction

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated caller, available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID taken from the token subject
    pub user_id: Uuid,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    /// Context for a known user with no request attached
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
    audience: Option<String>,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64, audience: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
            audience,
        }
    }

    /// Build from the `auth` config section; the secret is mandatory
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "auth.jwt_secret is not set".to_string(),
            })?;

        Ok(Self::new(secret, config.jwt_expiration_secs, config.jwt_audience.clone()))
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: Uuid, role: Option<String>) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            role,
            aud: self.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        let mut validation = Validation::default();
        match self.audience {
            Some(ref aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }

    /// Validate a token and turn its claims into a caller context
    pub fn authenticate(&self, token: &str, request_id: String) -> Result<AuthContext> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        Ok(AuthContext { user_id, request_id })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(AppError::authentication_required)?;

        let jwt = Arc::<JwtManager>::from_ref(state);
        jwt.authenticate(token, request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[derive(Clone)]
    struct TestState {
        jwt: Arc<JwtManager>,
    }

    impl FromRef<TestState> for Arc<JwtManager> {
        fn from_ref(state: &TestState) -> Self {
            state.jwt.clone()
        }
    }

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder()
            .uri("/functions/v1/reviews")
            .header("x-request-id", "req-42");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("abc.def"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600, None);
        let user_id = Uuid::new_v4();

        let token = manager.generate_token(user_id, Some("authenticated".to_string())).unwrap();
        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.role.as_deref(), Some("authenticated"));

        let context = manager.authenticate(&token, "req-1".to_string()).unwrap();
        assert_eq!(context.user_id, user_id);
        assert_eq!(context.request_id, "req-1");
    }

    #[test]
    fn test_wrong_secret_or_audience_is_invalid() {
        let issuer = JwtManager::new("issuer_secret", 3600, Some("authenticated".to_string()));
        let token = issuer.generate_token(Uuid::new_v4(), None).unwrap();

        let other_secret = JwtManager::new("other_secret", 3600, Some("authenticated".to_string()));
        assert!(matches!(other_secret.validate_token(&token), Err(AppError::InvalidToken)));

        let other_aud = JwtManager::new("issuer_secret", 3600, Some("service".to_string()));
        assert!(matches!(other_aud.validate_token(&token), Err(AppError::InvalidToken)));

        assert!(issuer.validate_token(&token).is_ok());
    }

    #[test]
    fn test_expired_token() {
        let manager = JwtManager::new("test_secret", 3600, None);
        let claims = JwtClaims {
            sub: Uuid::new_v4().to_string(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
            role: None,
            aud: None,
        };
        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        assert!(matches!(manager.validate_token(&token), Err(AppError::ExpiredToken)));
    }

    #[test]
    fn test_from_config_requires_secret() {
        let config = AuthConfig {
            jwt_secret: None,
            jwt_audience: None,
            jwt_expiration_secs: 3600,
        };
        assert!(matches!(
            JwtManager::from_config(&config),
            Err(AppError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_extractor() {
        let state = TestState {
            jwt: Arc::new(JwtManager::new("test_secret", 3600, None)),
        };
        let user_id = Uuid::new_v4();
        let token = state.jwt.generate_token(user_id, None).unwrap();

        let mut ok = parts(Some(&format!("Bearer {}", token)));
        let context = AuthContext::from_request_parts(&mut ok, &state).await.unwrap();
        assert_eq!(context.user_id, user_id);
        assert_eq!(context.request_id, "req-42");

        let mut missing = parts(None);
        let err = AuthContext::from_request_parts(&mut missing, &state).await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication required");

        let mut garbage = parts(Some("Bearer not-a-jwt"));
        let err = AuthContext::from_request_parts(&mut garbage, &state).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
