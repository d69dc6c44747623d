//! Direct messages: lead outreach, inbox replies and plain sends.

mod direct;
mod inbox;
mod outreach;
pub mod snapshot;

pub use snapshot::ConversationSnapshot;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::locator::Locator;

/// Result of one outreach attempt. Never an error: every failure mode is a
/// reported outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum OutreachOutcome {
    Sent,
    AlreadyContacted,
    /// The last visible message in the thread is already ours.
    AlreadyMessaged,
    NoMessageButton,
    NoComposer,
    /// Typed and submitted twice, but the text never showed up.
    Unverified,
    Failed(String),
}

impl fmt::Display for OutreachOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutreachOutcome::Sent => write!(f, "sent"),
            OutreachOutcome::AlreadyContacted => write!(f, "already contacted this session"),
            OutreachOutcome::AlreadyMessaged => write!(f, "last message already ours"),
            OutreachOutcome::NoMessageButton => write!(f, "no message button"),
            OutreachOutcome::NoComposer => write!(f, "no message composer"),
            OutreachOutcome::Unverified => write!(f, "delivery not verified"),
            OutreachOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Summary of one inbox pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InboxReport {
    pub examined: usize,
    pub replied: usize,
    pub skipped: BTreeMap<String, usize>,
}

impl InboxReport {
    pub(crate) fn skip(&mut self, reason: &str) {
        *self.skipped.entry(reason.to_string()).or_default() += 1;
    }
}

/// Result of a plain direct message to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectSend {
    pub username: String,
    pub sent: bool,
}

pub(crate) fn message_button() -> Locator {
    Locator::new("message button")
        .text("div[role=\"button\"]", &["Message"])
        .text("button", &["Message"])
        .text("a", &["Message"])
}

pub(crate) fn composer() -> Locator {
    Locator::new("message composer")
        .css("div[role=\"textbox\"][contenteditable=\"true\"]")
        .css("div[contenteditable=\"true\"]")
        .css("textarea[placeholder*=\"Message\"]")
        .css("textarea")
}

/// First `max` characters of a message, trimmed; used to spot it in the thread.
pub(crate) fn snippet(message: &str, max: usize) -> String {
    message.trim().chars().take(max).collect::<String>().trim().to_string()
}
