use std::cmp::Reverse;

use messenger_types::models::Message;
use messenger_types::timestamp::parse_timestamp;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session::SessionStore;

/// Newest first by parsed timestamp. Messages whose timestamp can't be
/// parsed go last, keeping their server order.
pub fn sort_newest_first(messages: &mut [Message]) {
    messages.sort_by_key(|m| Reverse(parse_timestamp(&m.timestamp)));
}

/// The signed-in user's messages, or every message when nobody is signed in.
pub async fn load_history(
    api: &ApiClient,
    sessions: &SessionStore,
) -> Result<Vec<Message>, ClientError> {
    let mut messages = match sessions.get() {
        Some(session) => api.read_messages_by_hash(&session.username_hash).await?,
        None => api.read_messages().await?,
    };
    sort_newest_first(&mut messages);
    Ok(messages)
}
