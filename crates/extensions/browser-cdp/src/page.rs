//! [`Page`] over a CDP session.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use autoengage_protocols::{Cookie, ElementSnapshot, Page, PageError, Viewport};

use crate::error::CdpError;
use crate::protocol::{Clip, ScreenshotFormat};
use crate::scripts;
use crate::session::PageSession;

const WAIT_POLL: Duration = Duration::from_millis(250);
const BACK_TIMEOUT: Duration = Duration::from_secs(30);

/// One Chrome tab.
pub struct CdpPage {
    session: PageSession,
}

impl CdpPage {
    pub fn new(session: PageSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    async fn snapshots(&self, script: &str) -> Result<Vec<ElementSnapshot>, CdpError> {
        match self.session.evaluate(script).await? {
            Value::Null => Ok(Vec::new()),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    /// Element clip in page coordinates.
    async fn element_clip(&self, selector: &str) -> Result<Clip, CdpError> {
        let node_id = self
            .session
            .query_selector_all(selector)
            .await?
            .first()
            .copied()
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;
        self.session.scroll_into_view(node_id).await?;

        let model = self
            .session
            .get_box_model(node_id)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(format!("{} (not visible)", selector)))?;
        let mut clip = Clip::from_quad(&model.border)
            .ok_or_else(|| CdpError::ElementNotFound(format!("{} (empty box)", selector)))?;

        let metrics = self.session.call("Page.getLayoutMetrics", None).await?;
        clip.x += metrics["cssVisualViewport"]["pageX"].as_f64().unwrap_or(0.0);
        clip.y += metrics["cssVisualViewport"]["pageY"].as_f64().unwrap_or(0.0);
        Ok(clip)
    }
}

fn cookie_param(cookie: &Cookie) -> Value {
    let mut param = json!({
        "name": cookie.name,
        "value": cookie.value,
        "domain": cookie.domain,
        "path": cookie.path,
        "httpOnly": cookie.http_only,
        "secure": cookie.secure,
    });
    if let Some(expires) = cookie.expires.filter(|e| *e > 0.0) {
        param["expires"] = json!(expires);
    }
    param
}

fn parse_cookies(result: &Value) -> Result<Vec<Cookie>, CdpError> {
    let cookies: Vec<Cookie> = serde_json::from_value(result["cookies"].clone())?;
    Ok(cookies
        .into_iter()
        .map(|mut c| {
            c.expires = c.expires.filter(|e| *e > 0.0);
            c
        })
        .collect())
}

#[async_trait]
impl Page for CdpPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), PageError> {
        Ok(self.session.navigate(url, timeout).await?)
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.session.get_url().await?)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError> {
        Ok(self.snapshots(&scripts::query_all(selector)).await?)
    }

    async fn query_within(
        &self,
        selector: &str,
        index: usize,
        child: &str,
    ) -> Result<Vec<ElementSnapshot>, PageError> {
        Ok(self
            .snapshots(&scripts::query_within(selector, index, child))
            .await?)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, PageError> {
        let start = Instant::now();
        loop {
            if self.exists(selector).await? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                debug!(selector, "wait_for timed out");
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL).await;
        }
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), PageError> {
        // Give a click-triggered navigation time to start before polling readiness.
        tokio::time::sleep(WAIT_POLL).await;
        Ok(self.session.wait_for_load(timeout).await?)
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError> {
        Ok(self.session.click_selector(selector, index).await?)
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), PageError> {
        Ok(self.session.click(x, y).await?)
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), PageError> {
        Ok(self.session.mouse_move(x, y).await?)
    }

    async fn scroll_by(&self, dy: f64) -> Result<(), PageError> {
        let viewport = self.viewport().await?;
        Ok(self
            .session
            .scroll(viewport.width / 2.0, viewport.height / 2.0, dy)
            .await?)
    }

    async fn scroll_element_to_bottom(&self, selector: &str) -> Result<Option<f64>, PageError> {
        let height = self
            .session
            .evaluate(&scripts::scroll_to_bottom(selector))
            .await?;
        Ok(height.as_f64())
    }

    async fn type_text(&self, text: &str) -> Result<(), PageError> {
        Ok(self.session.type_text(text).await?)
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        Ok(self.session.press_key(key).await?)
    }

    async fn press_key_combo(&self, modifiers: &[&str], key: &str) -> Result<(), PageError> {
        Ok(self.session.press_key_combo(modifiers, key).await?)
    }

    async fn screenshot(
        &self,
        selector: Option<&str>,
        full_page: bool,
    ) -> Result<Vec<u8>, PageError> {
        let clip = match selector {
            Some(sel) => Some(self.element_clip(sel).await?),
            None => None,
        };
        Ok(self
            .session
            .screenshot(ScreenshotFormat::Png, full_page, clip)
            .await?)
    }

    async fn viewport(&self) -> Result<Viewport, PageError> {
        let value = self
            .session
            .evaluate(scripts::VIEWPORT)
            .await?;
        serde_json::from_value(value).map_err(|e| PageError::Script(e.to_string()))
    }

    async fn evaluate(&self, script: &str) -> Result<Value, PageError> {
        Ok(self.session.evaluate(script).await?)
    }

    async fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Option<Value>, PageError> {
        let result = self
            .session
            .evaluate(&scripts::fetch_json(url, headers))
            .await?;
        Ok(scripts::fetch_body(result))
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), PageError> {
        let params: Vec<Value> = cookies.iter().map(cookie_param).collect();
        self.session
            .call("Network.setCookies", Some(json!({ "cookies": params })))
            .await?;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, PageError> {
        let result = self.session.call("Network.getCookies", None).await?;
        Ok(parse_cookies(&result)?)
    }

    async fn go_back(&self) -> Result<(), PageError> {
        Ok(self.session.go_back(BACK_TIMEOUT).await?)
    }

    async fn close(&self) -> Result<(), PageError> {
        Ok(self.session.close().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_param_drops_session_expiry() {
        let mut cookie = Cookie::new("sessionid", "v", ".instagram.com");
        cookie.expires = Some(-1.0);
        cookie.http_only = true;

        let param = cookie_param(&cookie);
        assert_eq!(param["httpOnly"], json!(true));
        assert_eq!(param["path"], json!("/"));
        assert!(param.get("expires").is_none());

        cookie.expires = Some(1_900_000_000.0);
        assert_eq!(cookie_param(&cookie)["expires"], json!(1_900_000_000.0));
    }

    #[test]
    fn test_parse_cookies() {
        let result = json!({
            "cookies": [
                {
                    "name": "csrftoken",
                    "value": "abc",
                    "domain": ".instagram.com",
                    "path": "/",
                    "expires": 1_900_000_000.0,
                    "size": 41,
                    "httpOnly": false,
                    "secure": true,
                    "session": false,
                    "sameSite": "Lax"
                },
                {
                    "name": "rur",
                    "value": "x",
                    "domain": ".instagram.com",
                    "path": "/",
                    "expires": -1,
                    "httpOnly": true,
                    "secure": true,
                    "session": true
                }
            ]
        });

        let cookies = parse_cookies(&result).unwrap();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "csrftoken");
        assert!(cookies[0].secure);
        assert_eq!(cookies[0].expires, Some(1_900_000_000.0));
        assert_eq!(cookies[1].expires, None);
        assert!(cookies[1].http_only);
    }
}
