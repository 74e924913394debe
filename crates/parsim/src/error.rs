use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use parsim_core::validation::FieldErrors;
use sea_orm::{DbErr, SqlErr};

use crate::models::ErrorResponse;

/// Everything a store operation or admin handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid form: {0}")]
    Validation(FieldErrors),

    /// The row is still referenced and the foreign key does not cascade.
    #[error("{0}")]
    Conflict(String),

    /// Body, query string or path could not be parsed.
    #[error("{0}")]
    InvalidPayload(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} with ID \u{201c}{id}\u{201d}"))
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    /// Maps a unique-index violation to a field error and passes everything
    /// else through unchanged.
    pub fn from_unique_violation(err: DbErr, field: &str, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::field(field, message),
            _ => Self::Database(err),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_failed",
            Self::Conflict(_) => "protected",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }
}

impl From<FieldErrors> for StoreError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (message, fields) = match self {
            Self::Validation(errors) => (
                "Please correct the errors below.".to_string(),
                Some(errors.clone()),
            ),
            Self::Database(e) => {
                log::error!("Database error: {}", e);
                ("Database error occurred".to_string(), None)
            }
            Self::Internal(e) => {
                log::error!("Internal error: {}", e);
                ("Internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_validation_error_renders_fields() {
        let err = StoreError::field("rating", "Select a valid choice.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "validation_failed");
        assert!(parsed.fields.unwrap().has("rating"));
    }

    #[actix_web::test]
    async fn test_database_error_is_not_echoed() {
        let err = StoreError::Database(DbErr::Custom("secret table layout".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains("internal_error"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StoreError::not_found("listing", 7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StoreError::Conflict("still referenced".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            StoreError::InvalidPayload("bad json".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_non_unique_db_errors_pass_through() {
        let err = StoreError::from_unique_violation(
            DbErr::Custom("boom".to_string()),
            "slug",
            "taken",
        );
        assert!(matches!(err, StoreError::Database(_)));
    }
}
