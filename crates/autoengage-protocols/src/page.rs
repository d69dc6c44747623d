//! Rendered page protocol.
//!
//! The engine never touches a browser directly. Everything it does to the
//! social surface goes through [`Page`], which keeps the engine testable
//! against a scripted double and lets the browser backend change freely.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::cookies::Cookie;
use crate::error::PageError;

/// Read-only snapshot of a DOM element taken at query time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Rendered text (`innerText`), trimmed.
    #[serde(default)]
    pub text: String,

    /// Attributes present on the element.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementSnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the element is marked disabled by attribute.
    pub fn is_disabled(&self) -> bool {
        self.attributes.contains_key("disabled")
            || self.attr("aria-disabled").is_some_and(|v| v == "true")
    }
}

/// Visible viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// A single rendered page.
///
/// Selectors are CSS selectors. Query methods report absence as an empty
/// result; action methods report absence as [`PageError::ElementNotFound`].
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate and wait until the document has loaded.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), PageError>;

    /// Current document URL.
    async fn current_url(&self) -> Result<String, PageError>;

    /// Snapshot every element matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError>;

    /// Snapshot elements matching `child` inside the `index`-th match of `selector`.
    async fn query_within(
        &self,
        selector: &str,
        index: usize,
        child: &str,
    ) -> Result<Vec<ElementSnapshot>, PageError>;

    /// First element matching `selector`.
    async fn query(&self, selector: &str) -> Result<Option<ElementSnapshot>, PageError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn exists(&self, selector: &str) -> Result<bool, PageError> {
        Ok(self.query(selector).await?.is_some())
    }

    /// Poll until `selector` matches or `timeout` elapses. Returns whether it appeared.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, PageError>;

    /// Wait for the next navigation to settle.
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), PageError>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), PageError> {
        self.click_nth(selector, 0).await
    }

    /// Click the `index`-th element matching `selector`.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError>;

    /// Click at viewport coordinates.
    async fn click_at(&self, x: f64, y: f64) -> Result<(), PageError>;

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), PageError>;

    /// Scroll the window vertically by `dy` pixels.
    async fn scroll_by(&self, dy: f64) -> Result<(), PageError>;

    /// Scroll a scrollable element to its bottom. Returns its scroll height,
    /// or `None` if the element is absent.
    async fn scroll_element_to_bottom(&self, selector: &str) -> Result<Option<f64>, PageError>;

    /// Insert text into the focused element.
    async fn type_text(&self, text: &str) -> Result<(), PageError>;

    /// Press and release a named key (`Enter`, `Escape`, `Backspace`, ...).
    async fn press_key(&self, key: &str) -> Result<(), PageError>;

    /// Press a key with modifiers held (`["Control"]`, `"a"`).
    async fn press_key_combo(&self, modifiers: &[&str], key: &str) -> Result<(), PageError>;

    /// PNG screenshot of an element (or the viewport / full page when `None`).
    async fn screenshot(
        &self,
        selector: Option<&str>,
        full_page: bool,
    ) -> Result<Vec<u8>, PageError>;

    async fn viewport(&self) -> Result<Viewport, PageError>;

    /// Evaluate a script and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError>;

    /// Authenticated `fetch` from the page context. `Ok(None)` on a non-2xx status.
    async fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<serde_json::Value>, PageError>;

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), PageError>;

    async fn cookies(&self) -> Result<Vec<Cookie>, PageError>;

    async fn go_back(&self) -> Result<(), PageError>;

    async fn close(&self) -> Result<(), PageError>;
}

/// A browser context able to open additional pages.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn Page>, PageError>;
}
