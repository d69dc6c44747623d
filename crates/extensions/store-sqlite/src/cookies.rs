//! JSON file [`CookieStore`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use autoengage_protocols::{Cookie, CookieError, CookieStore};

/// Cookies serialized as a JSON array in a single file.
pub struct JsonCookieStore {
    path: PathBuf,
}

impl JsonCookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CookieStore for JsonCookieStore {
    async fn load(&self) -> Result<Vec<Cookie>, CookieError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let cookies: Vec<Cookie> = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), count = cookies.len(), "Loaded cookies");
        Ok(cookies)
    }

    async fn save(&self, cookies: &[Cookie]) -> Result<(), CookieError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(cookies)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), count = cookies.len(), "Saved cookies");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCookieStore::new(dir.path().join("cookies.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCookieStore::new(dir.path().join("sub").join("cookies.json"));
        let mut session = Cookie::new("sessionid", "s3cr3t", ".instagram.com");
        session.http_only = true;
        session.secure = true;
        let cookies = vec![session, Cookie::new("csrftoken", "abc", ".instagram.com")];

        store.save(&cookies).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, cookies);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonCookieStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CookieError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_empty_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "").unwrap();
        assert!(JsonCookieStore::new(&path).load().await.unwrap().is_empty());
    }
}
