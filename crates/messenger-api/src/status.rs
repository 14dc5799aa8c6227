use axum::{Json, extract::State, response::IntoResponse};

use messenger_types::api::HealthResponse;

use crate::error::{ApiError, blocking};
use crate::state::AppState;

/// GET /, a plain-text summary of the store.
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (users, messages) =
        blocking(move || Ok((state.db.count_users()?, state.db.count_messages()?))).await?;
    Ok(format!(
        "Connected to the message store! Found {} users and {} messages.",
        users, messages
    ))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
