use crate::models::{MessageRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

/// Fields of a message about to be stored. `id` is assigned by the caller.
pub struct NewMessageRow<'a> {
    pub id: &'a str,
    pub username_hash: &'a str,
    pub phone_number: &'a str,
    pub content: &'a str,
    pub char_count: i64,
    pub timestamp: &'a str,
}

const MESSAGE_COLUMNS: &str = "id, username_hash, phone_number, content, char_count, timestamp";

impl Database {
    // -- Users --

    /// Insert a user. Returns false when the hash is already registered.
    pub fn create_user(&self, username_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO users (username_hash) VALUES (?1)",
                [username_hash],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_user(&self, username_hash: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, username_hash))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT username_hash FROM users ORDER BY rowid")?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no such user existed.
    pub fn delete_user(&self, username_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM users WHERE username_hash = ?1", [username_hash])?;
            Ok(deleted > 0)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, msg: &NewMessageRow<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, username_hash, phone_number, content, char_count, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    msg.id,
                    msg.username_hash,
                    msg.phone_number,
                    msg.content,
                    msg.char_count,
                    msg.timestamp,
                ],
            )?;
            Ok(())
        })
    }

    /// All messages in insertion order, optionally only those of one user.
    pub fn list_messages(&self, username_hash: Option<&str>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, username_hash))
    }

    /// Returns false when no such message existed.
    pub fn delete_message(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Delete every message of one user. Returns how many were removed.
    pub fn delete_messages_by_user(&self, username_hash: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM messages WHERE username_hash = ?1", [username_hash])?;
            Ok(deleted)
        })
    }

    pub fn count_messages(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        username_hash: row.get(0)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        username_hash: row.get(1)?,
        phone_number: row.get(2)?,
        content: row.get(3)?,
        char_count: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

fn query_user(conn: &Connection, username_hash: &str) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT username_hash FROM users WHERE username_hash = ?1",
        [username_hash],
        user_from_row,
    )
    .optional()
}

fn query_messages(conn: &Connection, username_hash: Option<&str>) -> Result<Vec<MessageRow>> {
    let rows = match username_hash {
        Some(hash) => {
            let sql = format!(
                "SELECT {} FROM messages WHERE username_hash = ?1 ORDER BY rowid",
                MESSAGE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([hash], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let sql = format!("SELECT {} FROM messages ORDER BY rowid", MESSAGE_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
