//! Interstitial dialog dismissal.

use std::time::Duration;

use tracing::{debug, info};

use crate::locator::Locator;
use crate::session::Session;

pub(crate) const DIALOG: &str = "div[role=\"dialog\"]";

const DISMISS_PHRASES: &[&str] = &[
    "not now",
    "cancel",
    "maybe later",
    "remind me later",
    "close",
    "no thanks",
    "skip",
    "x",
];

fn dismiss_locator() -> Locator {
    Locator::new("popup dismiss")
        .text("div[role=\"dialog\"] button", DISMISS_PHRASES)
        .text("div[role=\"dialog\"] div[role=\"button\"]", DISMISS_PHRASES)
        .css("div[role=\"dialog\"] svg[aria-label=\"Close\"]")
        .css("div[role=\"dialog\"] button[aria-label=\"Close\"]")
        .css("div[role=\"dialog\"] button:last-of-type")
}

impl Session {
    /// Close a notification/cookie/app-install dialog if one shows up.
    /// Returns whether something was dismissed.
    pub async fn handle_popup(&self) -> bool {
        let page = self.page.as_ref();
        match page.wait_for(DIALOG, Duration::from_millis(2500)).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                debug!(error = %e, "Popup check failed");
                return false;
            }
        }

        match dismiss_locator().click(page).await {
            Ok(true) => {
                info!("Dismissed popup");
                self.pacer.wait(1500).await;
                true
            }
            Ok(false) => {
                debug!("Dialog present but no dismiss control found");
                false
            }
            Err(e) => {
                debug!(error = %e, "Popup dismissal failed");
                false
            }
        }
    }

    /// Click every visible "Not now" button (inbox interstitials).
    pub async fn dismiss_not_now(&self) -> bool {
        let page = self.page.as_ref();
        let locator = Locator::new("not now").text("button", &["not now"]);
        let mut dismissed = false;
        for _ in 0..3 {
            match locator.click(page).await {
                Ok(true) => {
                    dismissed = true;
                    self.pacer.wait(500).await;
                }
                Ok(false) => break,
                Err(e) => {
                    debug!(error = %e, "Not-now dismissal failed");
                    break;
                }
            }
        }
        if dismissed {
            info!("Dismissed inbox prompts");
        }
        dismissed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_builder, FakePage};
    use autoengage_protocols::ElementSnapshot;

    #[tokio::test]
    async fn test_no_dialog() {
        let page = FakePage::new("https://www.instagram.com/");
        let session = session_builder(&page).build();
        assert!(!session.handle_popup().await);
        assert!(page.actions().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_by_phrase() {
        let page = FakePage::new("https://www.instagram.com/");
        page.set_text(DIALOG, "Turn on notifications");
        page.set(
            "div[role=\"dialog\"] button",
            vec![ElementSnapshot::new("Turn On"), ElementSnapshot::new("Not Now")],
        );
        page.on_click("div[role=\"dialog\"] button", |dom| dom.remove(DIALOG));
        let session = session_builder(&page).build();

        assert!(session.handle_popup().await);
        assert_eq!(page.clicks_on("div[role=\"dialog\"] button"), 1);
        assert!(!page.with_dom(|dom| dom.has(DIALOG)));
    }

    #[tokio::test]
    async fn test_dismiss_close_icon_fallback() {
        let page = FakePage::new("https://www.instagram.com/");
        page.set_text(DIALOG, "");
        page.set_text("div[role=\"dialog\"] svg[aria-label=\"Close\"]", "");
        let session = session_builder(&page).build();

        assert!(session.handle_popup().await);
        assert_eq!(
            page.clicks_on("div[role=\"dialog\"] svg[aria-label=\"Close\"]"),
            1
        );
    }

    #[tokio::test]
    async fn test_dismiss_not_now_repeats() {
        let page = FakePage::new("https://www.instagram.com/direct/inbox/");
        page.set_text("button", "Not Now");
        let mut remaining = 2;
        page.on_click("button", move |dom| {
            remaining -= 1;
            if remaining == 0 {
                dom.remove("button");
            }
        });
        let session = session_builder(&page).build();

        assert!(session.dismiss_not_now().await);
        assert_eq!(page.clicks_on("button"), 2);
    }
}
