//! Engine errors.

use thiserror::Error;

use autoengage_protocols::{CookieError, GenerationError, PageError, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cookie error: {0}")]
    Cookie(#[from] CookieError),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Required control missing: {0}")]
    ControlMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
