use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use messenger_types::api::UserPayload;
use messenger_types::models::User;
use messenger_types::validation::{FieldErrors, IMMUTABLE, TAKEN, validate_user};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";

/// POST /createUser
///
/// The hash is the credential; there is nothing else to check here.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let params = payload.into_params();
    validate_user(&params).map_err(ApiError::Validation)?;
    let username_hash = params.username_hash.unwrap_or_default();

    let db = state.clone();
    let hash = username_hash.clone();
    let created = blocking(move || db.db.create_user(&hash)).await?;
    if !created {
        return Err(ApiError::Conflict(FieldErrors::single("usernameHash", TAKEN)));
    }

    info!("User created");
    Ok((StatusCode::CREATED, Json(User { username_hash })))
}

/// GET /readUsers
pub async fn read_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || state.db.list_users()).await?;
    let users: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(Json(users))
}

/// GET /readUser/{hash}
pub async fn read_user(
    State(state): State<AppState>,
    Path(username_hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = find_user(state, username_hash).await?;
    Ok(Json(user))
}

/// PUT /updateUser/{hash}
///
/// Users are immutable: the body may only repeat the current hash.
pub async fn update_user(
    State(state): State<AppState>,
    Path(username_hash): Path<String>,
    Json(payload): Json<UserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = find_user(state, username_hash).await?;

    let params = payload.into_params();
    validate_user(&params).map_err(ApiError::Validation)?;
    if params.username_hash.as_deref() != Some(user.username_hash.as_str()) {
        return Err(ApiError::Validation(FieldErrors::single("usernameHash", IMMUTABLE)));
    }

    Ok(Json(user))
}

/// DELETE /deleteUser/{hash}
///
/// The user's messages are left alone; the client deletes them first.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username_hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = blocking(move || state.db.delete_user(&username_hash)).await?;
    if !deleted {
        return Err(ApiError::NotFound(USER_NOT_FOUND));
    }

    info!("User deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: AppState, username_hash: String) -> Result<User, ApiError> {
    blocking(move || state.db.get_user(&username_hash))
        .await?
        .map(User::from)
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))
}
