//! Operator-supplied direct messages.

use std::time::Duration;

use tracing::{info, warn};

use super::{composer, message_button, DirectSend};
use crate::error::EngineError;
use crate::navigator::profile_url;
use crate::session::{Session, NAV_TIMEOUT};

const BETWEEN_SENDS_MS: u64 = 30_000;

impl Session {
    /// Send `message` to `username`. Returns whether it was submitted.
    pub async fn send_direct_message(
        &self,
        username: &str,
        message: &str,
    ) -> Result<bool, EngineError> {
        let page = self.page.as_ref();
        page.goto(&profile_url(username), NAV_TIMEOUT).await?;
        self.pacer.wait(2500).await;
        self.handle_popup().await;

        if !message_button().click(page).await? {
            warn!(username, "No message button on profile");
            return Ok(false);
        }
        self.pacer.wait(3000).await;
        self.handle_popup().await;

        let Some(input) = composer().wait_locate(page, Duration::from_secs(6)).await? else {
            warn!(username, "No message composer");
            return Ok(false);
        };
        input.click(page).await?;
        self.pacer.wait(500).await;
        self.pacer.type_chars(page, message).await?;
        self.pacer.wait(500).await;
        page.press_key("Enter").await?;
        self.pacer.wait(2000).await;
        info!(username, "Direct message sent");
        Ok(true)
    }

    /// Send `message` to each user in turn, pausing between sends.
    pub async fn send_direct_messages(&self, usernames: &[String], message: &str) -> Vec<DirectSend> {
        let mut results = Vec::with_capacity(usernames.len());
        for (n, username) in usernames.iter().enumerate() {
            if n > 0 {
                self.pacer.wait(BETWEEN_SENDS_MS).await;
            }
            let sent = match self.send_direct_message(username, message).await {
                Ok(sent) => sent,
                Err(e) => {
                    warn!(username = %username, error = %e, "Direct message failed");
                    false
                }
            };
            results.push(DirectSend {
                username: username.clone(),
                sent,
            });
        }
        results
    }
}
