//! Database row types. These map directly to SQLite rows and stay separate
//! from the messenger-types wire models.
use messenger_types::models::{Message, User};
use uuid::Uuid;

pub struct UserRow {
    pub username_hash: String,
}

pub struct MessageRow {
    pub id: String,
    pub username_hash: String,
    pub phone_number: String,
    pub content: String,
    pub char_count: i64,
    pub timestamp: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            username_hash: row.username_hash,
        }
    }
}

impl MessageRow {
    /// Convert to the wire model. A corrupt id degrades to the nil UUID.
    pub fn into_message(self) -> Message {
        let id = self.id.parse().unwrap_or_else(|e| {
            tracing::warn!("Corrupt message id '{}': {}", self.id, e);
            Uuid::nil()
        });
        Message {
            id,
            phone_number: self.phone_number,
            timestamp: self.timestamp,
            content: self.content,
            char_count: u32::try_from(self.char_count).unwrap_or_default(),
            username_hash: self.username_hash,
        }
    }
}
