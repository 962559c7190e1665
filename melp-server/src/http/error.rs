//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Store and internal failures were logged where they were detected, so
//! nothing is logged here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use melp_core::ValidationError;
use serde_json::json;

use crate::service::ServiceError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Domain validation failed (400)
    Validation(ValidationError),

    /// Malformed body, query string or path (400)
    BadRequest { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Store or internal failure (500, generic message)
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(e) => json!({
                "error": "validation_error",
                "message": e.to_string()
            }),
            Self::BadRequest { message } => json!({
                "error": "bad_request",
                "message": message
            }),
            Self::NotFound { resource, id } => json!({
                "error": "not_found",
                "message": format!("{} '{}' not found", resource, id)
            }),
            Self::Internal => json!({
                "error": "internal_error",
                "message": "an internal error occurred"
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound { id } => Self::NotFound {
                resource: "restaurant",
                id,
            },
            ServiceError::Validation(v) => Self::Validation(v),
            ServiceError::DataSource(_) | ServiceError::Internal { .. } => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err: ApiError = ServiceError::NotFound { id: "abc".into() }.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "restaurant 'abc' not found");
    }

    #[tokio::test]
    async fn store_failure_is_500_without_details() {
        let err: ApiError = ServiceError::DataSource(DbError::DataSource {
            operation: "list restaurants",
            source: sqlx::Error::PoolTimedOut,
        })
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("list restaurants"));
    }

    #[test]
    fn internal_is_500() {
        let err: ApiError = ServiceError::Internal {
            message: "row count mismatch".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
