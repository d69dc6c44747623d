//! Lead-generation outreach.

use std::time::Duration;

use tracing::{debug, info, warn};

use autoengage_protocols::{GenerationRequest, Page, PageError};

use super::{composer, message_button, snippet, OutreachOutcome};
use crate::error::EngineError;
use crate::locator::Located;
use crate::navigator::profile_url;
use crate::prompts::{lead_prompt, message_schema, message_text};
use crate::session::Session;

const PROFILE_TIMEOUT: Duration = Duration::from_secs(35);
const FIRST_VERIFY: Duration = Duration::from_secs(8);
const RETRY_VERIFY: Duration = Duration::from_secs(10);
const SNIPPET_CHARS: usize = 40;

impl Session {
    /// Send a generated lead DM to `username`.
    ///
    /// The page is always returned to `return_url` (or history back when
    /// absent), whatever the outcome.
    pub async fn send_outreach(
        &mut self,
        username: &str,
        bio: Option<&str>,
        caption: Option<&str>,
        return_url: Option<&str>,
    ) -> OutreachOutcome {
        if self.has_contacted(username) {
            debug!(username, "Already contacted this session");
            return OutreachOutcome::AlreadyContacted;
        }

        info!(username, "Starting outreach");
        let outcome = match self.outreach_cycle(username, bio, caption).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(username, error = %e, "Outreach failed");
                OutreachOutcome::Failed(e.to_string())
            }
        };
        if outcome != OutreachOutcome::Sent {
            info!(username, outcome = %outcome, "Outreach not sent");
        }

        self.return_to(return_url).await;
        outcome
    }

    async fn outreach_cycle(
        &mut self,
        username: &str,
        bio: Option<&str>,
        caption: Option<&str>,
    ) -> Result<OutreachOutcome, EngineError> {
        let page = self.page.clone();
        let page = page.as_ref();

        page.goto(&profile_url(username), PROFILE_TIMEOUT).await?;
        self.pacer.wait(2500).await;
        self.handle_popup().await;
        self.audit
            .capture(page, "dm-screens", &format!("{}-profile", username))
            .await;

        if !message_button().click(page).await? {
            return Ok(OutreachOutcome::NoMessageButton);
        }
        self.pacer.wait(3000).await;
        self.handle_popup().await;

        let Some(input) = composer().wait_locate(page, Duration::from_secs(6)).await? else {
            return Ok(OutreachOutcome::NoComposer);
        };
        self.audit
            .capture(page, "dm-screens", &format!("{}-before", username))
            .await;

        let snapshot = self.read_conversation().await?;
        if snapshot.last_is_self {
            self.mark_contacted(username);
            return Ok(OutreachOutcome::AlreadyMessaged);
        }

        let message = self.lead_message(username, bio, caption).await;
        let needle = snippet(&message, SNIPPET_CHARS);

        self.type_and_send(page, &input, &message).await?;
        let mut delivered = self.wait_for_text(&needle, FIRST_VERIFY).await;
        if !delivered {
            warn!(username, "DM not visible yet, retrying once");
            self.pacer.wait(1200).await;
            let input = composer().locate(page).await?.unwrap_or(input);
            self.type_and_send(page, &input, &message).await?;
            delivered = self.wait_for_text(&needle, RETRY_VERIFY).await;
        }
        if !delivered {
            return Ok(OutreachOutcome::Unverified);
        }

        self.audit
            .capture(page, "dm-screens", &format!("{}-after", username))
            .await;
        self.mark_contacted(username);
        self.pacer.human_pause(page, 2500, 5000).await;
        Ok(OutreachOutcome::Sent)
    }

    async fn lead_message(&self, username: &str, bio: Option<&str>, caption: Option<&str>) -> String {
        let outreach = &self.settings.outreach;
        let request = GenerationRequest::new(
            message_schema(),
            lead_prompt(outreach, username, bio, caption),
        );
        match self.generator.generate(request).await {
            Ok(value) => message_text(&value).unwrap_or_else(|| {
                warn!(username, "Empty outreach generation, using fallback");
                outreach.fallback_message.clone()
            }),
            Err(e) => {
                warn!(username, error = %e, "Outreach generation failed, using fallback");
                outreach.fallback_message.clone()
            }
        }
    }

    /// Clear the composer, type the message and press Enter.
    pub(crate) async fn type_and_send(
        &self,
        page: &dyn Page,
        input: &Located,
        message: &str,
    ) -> Result<(), PageError> {
        input.click(page).await?;
        self.pacer.wait(400).await;
        page.press_key_combo(&["Control"], "a").await?;
        page.press_key("Backspace").await?;
        self.pacer.wait(200).await;

        let mut buf = [0u8; 4];
        for ch in message.chars() {
            page.type_text(ch.encode_utf8(&mut buf)).await?;
            self.pacer.delay(40, 160).await;
        }
        self.pacer.wait(400).await;
        page.press_key("Enter").await
    }

    async fn return_to(&self, return_url: Option<&str>) {
        let page = self.page.as_ref();
        match return_url {
            Some(url) => match page.goto(url, PROFILE_TIMEOUT).await {
                Ok(()) => {
                    self.pacer.wait(2000).await;
                    self.handle_popup().await;
                }
                Err(e) => warn!(url, error = %e, "Cannot return after outreach"),
            },
            None => match page.go_back().await {
                Ok(()) => self.pacer.wait(1500).await,
                Err(e) => warn!(error = %e, "Cannot go back after outreach"),
            },
        }
    }
}

#[cfg(test)]
#[path = "outreach_tests.rs"]
mod tests;
