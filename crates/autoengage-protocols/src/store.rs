//! Dedup store protocol.
//!
//! Records which posts have been commented on, keyed by permalink.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Core trait for persistent dedup stores.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Returns the store ID.
    fn id(&self) -> &str;

    /// Look up a record by permalink.
    async fn find(&self, permalink: &str) -> Result<Option<CommentedPostRecord>, StoreError>;

    /// Insert a record. Fails with [`StoreError::Duplicate`] when the
    /// permalink is already present.
    async fn insert(&self, record: CommentedPostRecord) -> Result<(), StoreError>;
}

/// A post the account has commented on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentedPostRecord {
    pub permalink: String,
    pub username: String,
    pub commented_at: chrono::DateTime<chrono::Utc>,
}

impl CommentedPostRecord {
    pub fn new(permalink: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            permalink: permalink.into(),
            username: username.into(),
            commented_at: chrono::Utc::now(),
        }
    }
}
