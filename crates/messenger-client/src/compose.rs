use chrono::{DateTime, Utc};
use tracing::info;

use messenger_types::api::NewMessage;
use messenger_types::models::Message;
use messenger_types::timestamp::format_timestamp;
use messenger_types::validation::{
    FieldErrors, MAX_CONTENT_LEN, check_content, check_phone_number, content_len,
};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::notifier::ReloadNotifier;
use crate::session::{Session, SessionStore};

/// What the compose form holds before it is sent.
#[derive(Debug, Clone, Default)]
pub struct MessageDraft {
    pub phone_number: String,
    pub content: String,
}

impl MessageDraft {
    pub fn new(phone_number: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            content: content.into(),
        }
    }

    pub fn char_count(&self) -> usize {
        content_len(&self.content)
    }

    /// Characters left before the content limit; negative once over it.
    pub fn remaining(&self) -> i64 {
        MAX_CONTENT_LEN as i64 - self.char_count() as i64
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_phone_number(Some(&self.phone_number), &mut errors);
        check_content(Some(&self.content), &mut errors);
        errors.into_result()
    }

    pub fn to_new_message(&self, session: &Session, now: DateTime<Utc>) -> NewMessage {
        NewMessage {
            phone_number: Some(self.phone_number.clone()),
            timestamp: Some(format_timestamp(now)),
            content: Some(self.content.clone()),
            char_count: Some(self.char_count() as i64),
            username_hash: Some(session.username_hash.clone()),
        }
    }
}

/// Validate, post and then tell history views to reload.
pub async fn send_message(
    api: &ApiClient,
    sessions: &SessionStore,
    notifier: &ReloadNotifier,
    draft: &MessageDraft,
) -> Result<Message, ClientError> {
    draft.validate().map_err(ClientError::Validation)?;
    let session = sessions.get().ok_or(ClientError::NoSession)?;

    let message = api
        .create_message(&draft.to_new_message(&session, Utc::now()))
        .await?;
    info!("Message {} sent to {}", message.id, message.phone_number);

    notifier.reload();
    Ok(message)
}
