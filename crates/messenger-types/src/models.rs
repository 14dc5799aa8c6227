use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The hash of `lowercase(username) + password` is the
/// whole identity; the server never sees the username or password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username_hash: String,
}

/// A message as stored by the server and returned by the read endpoints.
///
/// `username_hash` points at a [`User`] but nothing enforces that the user
/// still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub phone_number: String,
    pub timestamp: String,
    pub content: String,
    pub char_count: u32,
    pub username_hash: String,
}
