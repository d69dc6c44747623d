//! Conversation snapshots read from an open thread.

use std::time::Duration;

use tracing::debug;

use autoengage_protocols::PageError;

use crate::session::Session;

/// Messages kept per snapshot.
pub const MAX_MESSAGES: usize = 12;

/// Texts longer than this are containers, not messages.
const MAX_MESSAGE_CHARS: usize = 500;

const PLACEHOLDERS: &[&str] = &[
    "send a message to start a chat",
    "your messages",
    "share a thought",
    "send message",
];

const ATTACHMENT_NOTICE: &str = "sent an attachment";

/// Cascade of message selectors, most specific first.
const MESSAGE_SELECTORS: &[&str] = &[
    "div[role=\"dialog\"] div[role=\"listitem\"]",
    "div[role=\"dialog\"] li",
    "div[role=\"main\"] div[role=\"row\"] div[dir=\"auto\"]",
    "div[role=\"main\"] div[dir=\"auto\"]",
];

/// Whole-thread container used as a line-split fallback.
const THREAD_BODY: &str = "div[role=\"main\"]";

pub fn is_self_authored(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t.starts_with("you ") || t.starts_with("you:") || t.contains("you sent") || t.contains("you replied")
}

pub fn is_placeholder(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    PLACEHOLDERS.iter().any(|p| t.contains(p))
}

pub fn is_attachment_notice(text: &str) -> bool {
    text.to_lowercase().contains(ATTACHMENT_NOTICE)
}

/// The last visible messages of a thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSnapshot {
    pub messages: Vec<String>,
    pub last_is_self: bool,
}

impl ConversationSnapshot {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let all: Vec<String> = texts
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty() && t.chars().count() < MAX_MESSAGE_CHARS)
            .collect();
        let messages = all[all.len().saturating_sub(MAX_MESSAGES)..].to_vec();
        let last_is_self = messages.last().is_some_and(|m| is_self_authored(m));
        Self {
            messages,
            last_is_self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /// Every visible text is a placeholder.
    pub fn placeholder_only(&self) -> bool {
        !self.messages.is_empty() && self.messages.iter().all(|m| is_placeholder(m))
    }

    pub fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.messages.iter().any(|m| m.to_lowercase().contains(&needle))
    }
}

impl Session {
    /// Read the open thread through the selector cascade, falling back to
    /// the lines of the thread body.
    pub async fn read_conversation(&self) -> Result<ConversationSnapshot, PageError> {
        for selector in MESSAGE_SELECTORS {
            let elements = self.page.query_all(selector).await?;
            let snapshot = ConversationSnapshot::from_texts(elements.iter().map(|e| e.text.as_str()));
            if !snapshot.is_empty() {
                debug!(selector, messages = snapshot.messages.len(), "Conversation read");
                return Ok(snapshot);
            }
        }
        let body = self
            .page
            .query(THREAD_BODY)
            .await?
            .map(|el| el.text)
            .unwrap_or_default();
        Ok(ConversationSnapshot::from_texts(body.lines()))
    }

    /// Poll the thread every 500ms until `needle` shows up or `timeout`
    /// elapses on the session clock.
    pub(crate) async fn wait_for_text(&self, needle: &str, timeout: Duration) -> bool {
        let clock = self.pacer.clock().clone();
        let deadline = clock.now_millis() + timeout.as_millis() as i64;
        loop {
            match self.read_conversation().await {
                Ok(snapshot) if snapshot.contains(needle) => return true,
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Conversation read failed while verifying"),
            }
            if clock.now_millis() >= deadline {
                return false;
            }
            self.pacer.wait(500).await;
        }
    }
}
