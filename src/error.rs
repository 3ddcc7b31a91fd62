use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::catalog::CatalogError;

pub const FIELD_REQUIRED: &str = "This field is required.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";

/// Field name to caller-facing message.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Rendered as the bare field map, e.g. `{"title": "..."}`.
    #[error("invalid request body")]
    Validation(FieldErrors),
    /// Rendered under an `errors` key, e.g. `{"errors": {"from": "..."}}`.
    #[error("invalid query parameters")]
    InvalidQuery(FieldErrors),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MovieNotFound(_) | CatalogError::Provider(_) => {
                Self::NotFound(err.to_string())
            },
            CatalogError::Db(err) => err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::InvalidQuery(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            },
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            },
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Internal server error." })))
                    .into_response()
            },
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_surface_as_not_found() {
        let err: AppError = CatalogError::MovieNotFound(42).into();
        assert!(matches!(&err, AppError::NotFound(msg) if msg == "Movie with id 42 does not exist."));

        let err: AppError = CatalogError::Provider("Movie not found!".to_string()).into();
        assert!(matches!(&err, AppError::NotFound(msg) if msg == "Movie not found!"));
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let errors = FieldErrors::from([("title", FIELD_REQUIRED)]);
        assert_eq!(AppError::Validation(errors).into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotFound("gone".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
