//! Session struct and command dispatch.

use std::sync::Arc;

use base64::Engine;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::Transport;
use crate::error::CdpError;
use crate::protocol::{CdpResponse, Clip, ScreenshotFormat};

/// A flattened CDP session attached to one page target.
pub struct PageSession {
    pub(super) target_id: String,
    pub(super) session_id: String,
    transport: Arc<Transport>,
    /// Kept alive so the router's sender never errors.
    _event_rx: mpsc::UnboundedReceiver<CdpResponse>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Arc<Transport>,
        event_rx: mpsc::UnboundedReceiver<CdpResponse>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            transport,
            _event_rx: event_rx,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        self.call("Network.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Pin the layout viewport to a fixed size.
    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<(), CdpError> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            Some(json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 1,
                "mobile": false,
            })),
        )
        .await?;
        Ok(())
    }

    /// Capture a screenshot and return the decoded image bytes.
    pub async fn screenshot(
        &self,
        format: ScreenshotFormat,
        full_page: bool,
        clip: Option<Clip>,
    ) -> Result<Vec<u8>, CdpError> {
        let mut params = json!({
            "format": format,
            "captureBeyondViewport": full_page || clip.is_some(),
        });
        if let Some(c) = clip {
            params["clip"] = serde_json::to_value(c)?;
        }

        let result = self.call("Page.captureScreenshot", Some(params)).await?;
        let data = result["data"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing screenshot data".to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| CdpError::InvalidResponse(format!("Screenshot data: {}", e)))
    }

    /// Close the tab this session is attached to.
    pub async fn close(&self) -> Result<(), CdpError> {
        self.call("Page.close", None).await?;
        Ok(())
    }
}
