use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, messages)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                username_hash   TEXT PRIMARY KEY,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- username_hash is deliberately not a foreign key: messages
            -- outlive the account unless deleted explicitly.
            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                username_hash   TEXT NOT NULL,
                phone_number    TEXT NOT NULL,
                content         TEXT NOT NULL,
                char_count      INTEGER NOT NULL,
                timestamp       TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_user ON messages(username_hash);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    Ok(())
}
