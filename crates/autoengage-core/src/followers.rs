//! Follower list scraping.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::popups::DIALOG;
use crate::session::{Session, NAV_TIMEOUT};
use crate::site_url;
use crate::target::normalize_username;

static USER_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([a-zA-Z0-9._]+)/?$").expect("static regex"));

const DIALOG_LINKS: &str = "div[role=\"dialog\"] a[href^=\"/\"]";
const RESERVED: &[&str] = &["stories", "reel", "reels", "highlights", "explore", "direct", "p"];
const SLACK: usize = 4;
const MAX_SCROLLS: usize = 50;

/// Username from a site-relative profile href, if it is one.
pub fn username_from_href(href: &str) -> Option<String> {
    let caps = USER_PATH.captures(href)?;
    let name = caps.get(1)?.as_str().to_lowercase();
    (!RESERVED.contains(&name.as_str())).then_some(name)
}

impl Session {
    /// Collect up to `max` follower usernames of `account`.
    pub async fn scrape_followers(&self, account: &str, max: usize) -> Result<Vec<String>, EngineError> {
        let account = normalize_username(account).to_lowercase();
        let page = self.page.as_ref();

        page.goto(&site_url(&format!("{}/followers/", account)), NAV_TIMEOUT)
            .await?;
        self.pacer.wait(3000).await;
        if !page.wait_for(DIALOG, Duration::from_secs(10)).await? {
            warn!(account = %account, "Followers dialog did not open");
            return Ok(Vec::new());
        }

        let want = max + SLACK;
        let mut seen = HashSet::new();
        let mut followers = Vec::new();
        let mut last_height = None;

        for _ in 0..MAX_SCROLLS {
            for link in page.query_all(DIALOG_LINKS).await? {
                let Some(name) = link.attr("href").and_then(username_from_href) else {
                    continue;
                };
                if name != account && seen.insert(name.clone()) {
                    followers.push(name);
                }
            }
            if followers.len() >= want {
                break;
            }

            let height = page.scroll_element_to_bottom(DIALOG).await?;
            if height.is_none() || height == last_height {
                debug!(collected = followers.len(), "Follower list stopped growing");
                break;
            }
            last_height = height;
            self.pacer.wait(1500).await;
        }

        followers.truncate(max);
        info!(account = %account, count = followers.len(), "Collected followers");
        Ok(followers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_builder, FakePage};
    use autoengage_protocols::ElementSnapshot;

    fn link(href: &str) -> ElementSnapshot {
        ElementSnapshot::new("").with_attr("href", href)
    }

    #[test]
    fn test_username_from_href() {
        assert_eq!(username_from_href("/chef.anna/"), Some("chef.anna".to_string()));
        assert_eq!(username_from_href("/Joe_1"), Some("joe_1".to_string()));
        assert_eq!(username_from_href("/explore/"), None);
        assert_eq!(username_from_href("/stories/anna/"), None);
        assert_eq!(username_from_href("/p/abc/"), None);
    }

    #[tokio::test]
    async fn test_stops_at_requested_plus_slack() {
        let page = FakePage::new("https://www.instagram.com/");
        page.set(DIALOG, vec![ElementSnapshot::new("").with_attr("scrollHeight", "900")]);
        page.set(
            DIALOG_LINKS,
            vec![
                link("/rival/"),
                link("/a/"),
                link("/a/"),
                link("/stories/x/"),
                link("/b/"),
                link("/c/"),
                link("/d/"),
                link("/e/"),
                link("/f/"),
            ],
        );
        let session = session_builder(&page).build();

        let followers = session.scrape_followers("@rival", 2).await.unwrap();

        assert_eq!(followers, vec!["a", "b"]);
        assert_eq!(page.visited(), vec!["https://www.instagram.com/rival/followers/"]);
        assert!(!page
            .actions()
            .iter()
            .any(|a| matches!(a, crate::testing::PageAction::ScrollElement(_))));
    }

    #[tokio::test]
    async fn test_stops_when_height_unchanged() {
        let page = FakePage::new("https://www.instagram.com/");
        page.set(DIALOG, vec![ElementSnapshot::new("").with_attr("scrollHeight", "500")]);
        page.set(DIALOG_LINKS, vec![link("/a/"), link("/b/")]);
        let session = session_builder(&page).build();

        let followers = session.scrape_followers("rival", 10).await.unwrap();

        assert_eq!(followers, vec!["a", "b"]);
        let scrolls = page
            .actions()
            .iter()
            .filter(|a| matches!(a, crate::testing::PageAction::ScrollElement(_)))
            .count();
        assert_eq!(scrolls, 2);
    }

    #[tokio::test]
    async fn test_dialog_missing() {
        let page = FakePage::new("https://www.instagram.com/");
        let session = session_builder(&page).build();
        assert!(session.scrape_followers("rival", 5).await.unwrap().is_empty());
    }
}
