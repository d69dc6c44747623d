//! Inbox monitoring: open unread threads first and reply where the other
//! side spoke last.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use autoengage_protocols::{GenerationRequest, PageError};

use super::snapshot::{is_attachment_notice, is_placeholder};
use super::{ConversationSnapshot, InboxReport};
use crate::error::EngineError;
use crate::prompts::{message_schema, message_text, reply_prompt};
use crate::session::{Session, NAV_TIMEOUT};
use crate::site_url;

/// Threads loaded per batch at most.
pub const DEFAULT_BATCH: usize = 20;

const THREAD_ROWS: &str = "div[role=\"listitem\"]";
const THREAD_LIST: &str = "div[aria-label=\"Thread list\"]";
const UNREAD_BADGE: &str = "span[aria-label*=\"nread\"], div[aria-label*=\"nread\"]";
const REPLY_BOX: &str = "div[contenteditable=\"true\"]";
const LOAD_ATTEMPTS: usize = 4;

const SECTION_HEADERS: &[&str] = &["messages", "requests", "primary", "general", "notes", "your note"];

/// A thread row worth opening.
#[derive(Debug, Clone, PartialEq)]
struct ThreadRow {
    index: usize,
    title: String,
    unread: bool,
}

fn row_title(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

fn is_conversation_row(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() || is_placeholder(t) {
        return false;
    }
    let first = t.lines().next().unwrap_or_default().trim().to_lowercase();
    !SECTION_HEADERS.contains(&first.as_str())
}

impl Session {
    /// Visit the inbox and answer up to `max` threads, in batches of at most
    /// [`DEFAULT_BATCH`]. A `max` of zero means one batch.
    ///
    /// The inbox is reloaded after every thread, so each thread is located
    /// again by title. Rows that vanished in between are skipped.
    pub async fn monitor_inbox(&mut self, max: usize) -> Result<InboxReport, EngineError> {
        let cap = if max == 0 { DEFAULT_BATCH } else { max };
        let mut report = InboxReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        self.open_inbox().await?;
        let mut fresh_page = true;
        while report.examined < cap {
            if !fresh_page {
                self.open_inbox().await?;
            }
            let want = (cap - report.examined).min(DEFAULT_BATCH);
            let batch = self.load_threads(want, &seen).await?;
            fresh_page = true;
            if batch.is_empty() {
                break;
            }
            info!(threads = batch.len(), seen = seen.len(), "Inbox batch to examine");

            for title in batch.into_iter().map(|row| row.title) {
                if report.examined >= cap {
                    break;
                }
                if !fresh_page {
                    self.open_inbox().await?;
                    fresh_page = true;
                }
                seen.insert(title.clone());
                let Some(row) = self.locate_thread(&title).await? else {
                    debug!(thread = %title, "Thread no longer listed");
                    fresh_page = false;
                    continue;
                };

                report.examined += 1;
                fresh_page = false;
                match self.handle_thread(&row).await {
                    Ok(None) => report.replied += 1,
                    Ok(Some(reason)) => {
                        info!(thread = %row.title, reason, "Thread skipped");
                        report.skip(reason);
                    }
                    Err(e) => {
                        warn!(thread = %row.title, error = %e, "Thread failed");
                        report.skip("error");
                    }
                }
            }
        }

        info!(
            examined = report.examined,
            replied = report.replied,
            "Inbox pass finished"
        );
        Ok(report)
    }

    async fn open_inbox(&self) -> Result<(), PageError> {
        self.page.goto(&site_url("direct/inbox/"), NAV_TIMEOUT).await?;
        self.pacer.wait(5000).await;
        if self.dismiss_not_now().await {
            self.pacer.wait(2000).await;
        }
        Ok(())
    }

    /// Conversation rows currently rendered, in page order.
    async fn visible_threads(&self) -> Result<Vec<ThreadRow>, PageError> {
        let page = self.page.as_ref();
        let elements = page.query_all(THREAD_ROWS).await?;
        let mut rows = Vec::new();
        for (index, el) in elements.iter().enumerate() {
            if !is_conversation_row(&el.text) {
                continue;
            }
            let unread = !page.query_within(THREAD_ROWS, index, UNREAD_BADGE).await?.is_empty();
            rows.push(ThreadRow {
                index,
                title: row_title(&el.text),
                unread,
            });
        }
        Ok(rows)
    }

    /// Scroll the thread list once. Returns false when it cannot scroll.
    async fn scroll_threads(&self) -> bool {
        match self.page.scroll_element_to_bottom(THREAD_LIST).await {
            Ok(Some(_)) => {
                self.pacer.wait(1500).await;
                true
            }
            Ok(None) => {
                debug!("Thread list not scrollable");
                false
            }
            Err(e) => {
                debug!(error = %e, "Thread list scroll failed");
                false
            }
        }
    }

    /// Up to `want` rows not in `seen`, unread first, loading more by
    /// scrolling the list.
    async fn load_threads(
        &self,
        want: usize,
        seen: &HashSet<String>,
    ) -> Result<Vec<ThreadRow>, PageError> {
        let attempts = LOAD_ATTEMPTS + seen.len() / DEFAULT_BATCH;
        let mut rows = Vec::new();
        for attempt in 0..attempts {
            rows = self.visible_threads().await?;
            rows.retain(|row| !seen.contains(&row.title));
            if rows.len() >= want || attempt + 1 == attempts || !self.scroll_threads().await {
                break;
            }
        }

        rows.sort_by_key(|row| !row.unread);
        rows.truncate(want);
        Ok(rows)
    }

    /// Current row of the thread titled `title`, scrolling the list when it
    /// is not rendered yet.
    async fn locate_thread(&self, title: &str) -> Result<Option<ThreadRow>, PageError> {
        for attempt in 0..LOAD_ATTEMPTS {
            let rows = self.visible_threads().await?;
            if let Some(row) = rows.into_iter().find(|row| row.title == title) {
                return Ok(Some(row));
            }
            if attempt + 1 == LOAD_ATTEMPTS || !self.scroll_threads().await {
                break;
            }
        }
        Ok(None)
    }

    /// Returns the skip reason, or `None` when a reply was sent.
    async fn handle_thread(&self, row: &ThreadRow) -> Result<Option<&'static str>, EngineError> {
        let page = self.page.as_ref();
        page.click_nth(THREAD_ROWS, row.index).await?;
        self.pacer.wait(3000).await;
        self.dismiss_not_now().await;

        let mut snapshot = self.read_conversation().await?;
        if snapshot.is_empty() || snapshot.placeholder_only() {
            self.pacer.wait(2000).await;
            snapshot = self.read_conversation().await?;
        }
        if let Some(reason) = skip_reason(&snapshot) {
            return Ok(Some(reason));
        }

        let reply = self.reply_text(&snapshot).await;
        self.audit.capture(page, "dm-screens", &row.title).await;

        if !page.wait_for(REPLY_BOX, Duration::from_secs(5)).await? {
            return Ok(Some("no_composer"));
        }
        page.click(REPLY_BOX).await?;
        self.pacer.wait(500).await;
        self.pacer.type_chars(page, &reply).await?;
        self.pacer.wait(1000).await;
        page.press_key("Enter").await?;
        info!(thread = %row.title, "Replied");
        self.pacer.delay(3000, 8000).await;
        Ok(None)
    }

    async fn reply_text(&self, snapshot: &ConversationSnapshot) -> String {
        let outreach = &self.settings.outreach;
        let request =
            GenerationRequest::new(message_schema(), reply_prompt(outreach, &snapshot.messages));
        match self.generator.generate(request).await {
            Ok(value) => message_text(&value).unwrap_or_else(|| outreach.reply_fallback.clone()),
            Err(e) => {
                warn!(error = %e, "Reply generation failed, using fallback");
                outreach.reply_fallback.clone()
            }
        }
    }
}

fn skip_reason(snapshot: &ConversationSnapshot) -> Option<&'static str> {
    let Some(last) = snapshot.last() else {
        return Some("no_messages");
    };
    if snapshot.placeholder_only() {
        return Some("placeholder");
    }
    if snapshot.last_is_self {
        return Some("last_is_self");
    }
    if is_attachment_notice(last) {
        return Some("attachment");
    }
    None
}
