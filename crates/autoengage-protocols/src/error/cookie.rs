//! Cookie store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
