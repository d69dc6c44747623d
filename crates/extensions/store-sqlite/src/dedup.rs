//! SQLite-backed [`DedupStore`].

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode};
use tokio_rusqlite::Connection;
use tracing::debug;

use autoengage_protocols::{CommentedPostRecord, DedupStore, StoreError};

use crate::schema::init_schema;

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;

/// Permalink-keyed record of commented posts.
pub struct SqliteDedupStore {
    conn: Connection,
}

impl SqliteDedupStore {
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open (creating if needed) a database file. Parent directories are created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Number of recorded posts.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.conn
            .call(|conn| {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM commented_posts", [], |row| {
                    row.get(0)
                })?;
                Ok(n as u64)
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl DedupStore for SqliteDedupStore {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn find(&self, permalink: &str) -> Result<Option<CommentedPostRecord>, StoreError> {
        let permalink = permalink.to_string();
        self.conn
            .call(move |conn| {
                let row = conn.query_row(
                    "SELECT permalink, username, commented_at FROM commented_posts WHERE permalink = ?1",
                    [&permalink],
                    |row| {
                        let permalink: String = row.get(0)?;
                        let username: String = row.get(1)?;
                        let commented_at: String = row.get(2)?;
                        Ok((permalink, username, commented_at))
                    },
                );

                match row {
                    Ok((permalink, username, commented_at)) => {
                        let commented_at = DateTime::parse_from_rfc3339(&commented_at)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now());
                        Ok(Some(CommentedPostRecord {
                            permalink,
                            username,
                            commented_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }

    async fn insert(&self, record: CommentedPostRecord) -> Result<(), StoreError> {
        let permalink = record.permalink.clone();
        let inserted = self
            .conn
            .call(move |conn| {
                let result = conn.execute(
                    "INSERT INTO commented_posts (permalink, username, commented_at) VALUES (?1, ?2, ?3)",
                    params![
                        record.permalink,
                        record.username,
                        record.commented_at.to_rfc3339()
                    ],
                );
                match result {
                    Ok(_) => Ok(true),
                    Err(e) if is_unique_violation(&e) => Ok(false),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;

        if inserted {
            debug!(permalink = %permalink, "Recorded commented post");
            Ok(())
        } else {
            Err(StoreError::Duplicate(permalink))
        }
    }
}
