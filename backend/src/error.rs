use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{repository::RepositoryError, validation::FieldErrors};

/// AppError
///
/// Every failure a handler can report. Validation problems, the consumed-services
/// rule and data-layer failures are kept apart so the dashboard can show each one
/// differently (inline messages, a blocking notice, a generic error banner).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("authorization {unique_code} has {consumed} of {authorized} services consumed")]
    ServicesConsumed {
        unique_code: String,
        consumed: i32,
        authorized: i32,
    },

    #[error("user has {consumed} consumed services")]
    UserServicesConsumed { consumed: i64 },

    #[error("unique code {0} is already in use")]
    DuplicateCode(String),

    #[error("no unique codes left for year {0}")]
    CodeSpaceExhausted(i32),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors }))).into_response()
            }
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{what} no encontrado") })),
            )
                .into_response(),
            AppError::ServicesConsumed {
                unique_code,
                consumed,
                authorized,
            } => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "No se puede anular porque tiene servicios asociados",
                    "unique_code": unique_code,
                    "consumed": consumed,
                    "authorized": authorized,
                })),
            )
                .into_response(),
            AppError::UserServicesConsumed { consumed } => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "No se puede eliminar el usuario porque tiene servicios asociados",
                    "consumed": consumed,
                })),
            )
                .into_response(),
            AppError::DuplicateCode(code) => (
                StatusCode::CONFLICT,
                Json(json!({ "error": format!("El código único {code} ya existe") })),
            )
                .into_response(),
            AppError::CodeSpaceExhausted(year) => {
                tracing::warn!(year, "unique code space exhausted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "No hay códigos únicos disponibles" })),
                )
                    .into_response()
            }
            AppError::Repository(e) => {
                // The detail goes to the log; the client gets a single readable message.
                tracing::error!("repository error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Error al cargar los datos" })),
                )
                    .into_response()
            }
        }
    }
}
