use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use messenger_types::api::ErrorResponse;
use messenger_types::validation::FieldErrors;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(FieldErrors),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    SmsDelivery(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response(),
            ApiError::Conflict(errors) => (StatusCode::CONFLICT, Json(errors)).into_response(),
            ApiError::NotFound(what) => error_body(StatusCode::NOT_FOUND, what.to_string()),
            ApiError::SmsDelivery(reason) => error_body(StatusCode::SERVICE_UNAVAILABLE, reason),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        }
    }
}

fn error_body(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// Run a blocking DB call off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
        .map_err(ApiError::from)
}
