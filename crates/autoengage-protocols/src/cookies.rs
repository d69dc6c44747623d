//! Cookie store protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CookieError;

/// A browser cookie as persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix seconds; negative or absent for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: None,
            http_only: false,
            secure: false,
        }
    }
}

/// Load/save contract over a serialized cookie list.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Load saved cookies. An absent store yields an empty list.
    async fn load(&self) -> Result<Vec<Cookie>, CookieError>;

    async fn save(&self, cookies: &[Cookie]) -> Result<(), CookieError>;
}
