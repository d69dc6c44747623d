//! Database schema management.

use rusqlite::Connection;

/// Create tables if missing.
pub fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS commented_posts (
    permalink TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL,
    commented_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_commented_posts_username ON commented_posts(username);
"#;
