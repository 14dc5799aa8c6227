use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use messenger_db::queries::NewMessageRow;
use messenger_types::api::{MessagePayload, MessageQuery};
use messenger_types::models::Message;
use messenger_types::timestamp::format_timestamp;
use messenger_types::validation::{content_len, validate_new_message};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

const MESSAGE_NOT_FOUND: &str = "Message not found";

/// POST /createMessage
///
/// Stores the message, then relays it to the SMS gateway. If the gateway
/// fails the stored message is removed again and the request fails with 503,
/// so every stored message was accepted by the gateway.
pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<MessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = payload.into_message();
    validate_new_message(&draft).map_err(ApiError::Validation)?;

    let content = draft.content.unwrap_or_default();
    let message = Message {
        id: Uuid::new_v4(),
        phone_number: draft.phone_number.unwrap_or_default(),
        timestamp: draft
            .timestamp
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format_timestamp(chrono::Utc::now())),
        char_count: content_len(&content) as u32,
        content,
        username_hash: draft.username_hash.unwrap_or_default(),
    };

    let db = state.clone();
    let stored = message.clone();
    blocking(move || {
        db.db.insert_message(&NewMessageRow {
            id: &stored.id.to_string(),
            username_hash: &stored.username_hash,
            phone_number: &stored.phone_number,
            content: &stored.content,
            char_count: i64::from(stored.char_count),
            timestamp: &stored.timestamp,
        })
    })
    .await?;

    match state.sms.send_sms(&message.phone_number, &message.content).await {
        Ok(sid) => {
            info!(message_id = %message.id, sid = %sid, "SMS delivered");
            Ok((StatusCode::CREATED, Json(message)))
        }
        Err(e) => {
            error!(
                message_id = %message.id,
                phone = %message.phone_number,
                username_hash = %message.username_hash,
                char_count = message.char_count,
                timestamp = %message.timestamp,
                "SMS delivery failed: {}",
                e
            );

            let db = state.clone();
            let id = message.id.to_string();
            if let Err(rollback) = blocking(move || db.db.delete_message(&id)).await {
                warn!(message_id = %message.id, "Rollback of undelivered message failed: {}", rollback);
            }

            Err(ApiError::SmsDelivery(e.to_string()))
        }
    }
}

/// GET /readMessages, optionally filtered with `?hash=`.
pub async fn read_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.hash.filter(|h| !h.is_empty());
    list_messages(state, filter).await
}

/// GET /readMessages/{hash}
pub async fn read_messages_by_user(
    State(state): State<AppState>,
    Path(username_hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    list_messages(state, Some(username_hash)).await
}

/// DELETE /deleteMessages/{hash}
pub async fn delete_messages_by_user(
    State(state): State<AppState>,
    Path(username_hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = blocking(move || state.db.delete_messages_by_user(&username_hash)).await?;
    info!("Deleted {} messages", deleted);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /deleteMessage/{id}
///
/// An id that isn't a UUID can't name a stored message, so it is a 404 too.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound(MESSAGE_NOT_FOUND))?;
    let deleted = blocking(move || state.db.delete_message(&id.to_string())).await?;
    if !deleted {
        return Err(ApiError::NotFound(MESSAGE_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_messages(
    state: AppState,
    username_hash: Option<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let rows = blocking(move || state.db.list_messages(username_hash.as_deref())).await?;
    Ok(Json(rows.into_iter().map(|row| row.into_message()).collect()))
}
