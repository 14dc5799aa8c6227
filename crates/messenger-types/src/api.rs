use serde::{Deserialize, Serialize};

// -- Users --

/// Permitted user attributes. Everything else in the body is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_hash: Option<String>,
}

/// Body of `POST /createUser` and `PUT /updateUser/{hash}`.
///
/// Accepted either wrapped as `{"user": {...}}` or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserPayload {
    Wrapped { user: UserParams },
    Bare(UserParams),
}

impl UserPayload {
    pub fn into_params(self) -> UserParams {
        match self {
            Self::Wrapped { user } => user,
            Self::Bare(params) => params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateUserRequest<'a> {
    pub user: &'a UserParams,
}

// -- Messages --

/// Permitted message attributes for `POST /createMessage`.
///
/// `timestamp` and `char_count` may be left out; the server fills them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_hash: Option<String>,
}

/// Body of `POST /createMessage`, wrapped as `{"message": {...}}` or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    Wrapped { message: NewMessage },
    Bare(NewMessage),
}

impl MessagePayload {
    pub fn into_message(self) -> NewMessage {
        match self {
            Self::Wrapped { message } => message,
            Self::Bare(message) => message,
        }
    }
}

/// Query string of `GET /readMessages`.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(default, alias = "username_hash", alias = "usernameHash")]
    pub hash: Option<String>,
}

// -- Errors --

/// Body of 404 and 503 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_payload_accepts_wrapped_and_bare() {
        let wrapped: UserPayload =
            serde_json::from_str(r#"{"user":{"usernameHash":"abc"}}"#).unwrap();
        assert_eq!(wrapped.into_params().username_hash.as_deref(), Some("abc"));

        let bare: UserPayload = serde_json::from_str(r#"{"usernameHash":"abc"}"#).unwrap();
        assert_eq!(bare.into_params().username_hash.as_deref(), Some("abc"));

        let empty: UserPayload = serde_json::from_str("{}").unwrap();
        assert!(empty.into_params().username_hash.is_none());
    }

    #[test]
    fn message_payload_ignores_unpermitted_fields() {
        let payload: MessagePayload = serde_json::from_str(
            r#"{"message":{"phoneNumber":"5551234567","content":"hi","admin":true}}"#,
        )
        .unwrap();
        let msg = payload.into_message();
        assert_eq!(msg.phone_number.as_deref(), Some("5551234567"));
        assert_eq!(msg.content.as_deref(), Some("hi"));
        assert!(msg.char_count.is_none());
    }

    #[test]
    fn message_query_aliases() {
        for qs in [r#"{"hash":"h"}"#, r#"{"username_hash":"h"}"#, r#"{"usernameHash":"h"}"#] {
            let q: MessageQuery = serde_json::from_str(qs).unwrap();
            assert_eq!(q.hash.as_deref(), Some("h"));
        }
    }
}
