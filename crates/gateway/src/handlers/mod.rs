//! API handlers module

pub mod health;
pub mod reviews;
pub mod search;
pub mod votes;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Json, Query},
    http::{Method, Uri},
    BoxError,
};
use campusrate_common::errors::{AppError, Result};
use tower::timeout::error::Elapsed;
use uuid::Uuid;

/// Unwrap a JSON body, turning any rejection into a 400 envelope
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidFormat {
            message: rejection.body_text(),
        })
}

/// Unwrap query parameters, turning any rejection into a 400 envelope
pub fn query_params<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::InvalidFormat {
            message: rejection.body_text(),
        })
}

/// A present, non-blank value or `MissingField`
pub fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::MissingField {
            field: field.to_string(),
        })
}

pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| AppError::InvalidFormat {
        message: format!("{} must be a UUID", field),
    })
}

/// Route exists but not for this method
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    tracing::debug!(%method, path = uri.path(), "Method not allowed");
    AppError::MethodNotAllowed
}

/// Error handler for the request timeout layer
pub async fn request_timeout(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal {
            message: format!("Unhandled middleware error: {}", err),
        }
    }
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound {
        resource_type: "route".to_string(),
        id: uri.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(required(Some("abc".into()), "x").unwrap(), "abc");
        assert!(matches!(required(Some("  ".into()), "x"), Err(AppError::MissingField { .. })));
        assert!(matches!(required(None, "itemId"), Err(AppError::MissingField { field }) if field == "itemId"));
    }

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "votable_id").unwrap(), id);
        assert!(matches!(parse_uuid("42", "votable_id"), Err(AppError::InvalidFormat { .. })));
    }

    #[tokio::test]
    async fn test_request_timeout_mapping() {
        let elapsed = request_timeout(Box::new(Elapsed::new())).await;
        assert!(matches!(elapsed, AppError::Timeout));

        let other = request_timeout("boom".into()).await;
        assert!(other.is_server_error());
    }
}
