//! Page (browser surface) errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Page closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}

impl PageError {
    /// True when the error means "the thing we looked for is not there".
    ///
    /// Callers with a fallback treat these as feature absence rather than failure.
    pub fn is_absence(&self) -> bool {
        matches!(self, PageError::ElementNotFound(_) | PageError::Timeout(_))
    }
}
