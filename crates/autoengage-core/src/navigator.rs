//! Surface navigation.

use std::time::Duration;

use tracing::{info, warn};

use crate::locator::Locator;
use crate::session::{Session, NAV_TIMEOUT};
use crate::site_url;
use crate::target::{LocationTarget, Target};

const POST_LINKS: &str = "a[href*=\"/p/\"], a[href*=\"/reel/\"]";

/// Result of putting the page on a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Ready,
    Unavailable(String),
}

/// URL of the profile for `username`.
pub fn profile_url(username: &str) -> String {
    site_url(&format!("{}/", username))
}

impl Session {
    /// Navigate to the surface for `target`. Single-post surfaces also open
    /// their first post.
    pub async fn navigate(&self, target: &Target) -> Surface {
        let url = match target {
            Target::Feed => site_url(""),
            Target::Explore => site_url("explore/"),
            Target::User(username) => profile_url(username),
            Target::Hashtag(tag) => site_url(&format!("explore/tags/{}/", tag)),
            Target::Location(LocationTarget::Path(path)) => {
                site_url(&format!("explore/locations/{}", path))
            }
            Target::Location(LocationTarget::Query { query, coordinates }) => {
                match self.resolve_location(query, *coordinates).await {
                    Some(path) => site_url(&format!("explore/locations/{}", path)),
                    None => return Surface::Unavailable(format!("location '{}' not found", query)),
                }
            }
            Target::CompetitorFollowers { .. } | Target::Stories { .. } => {
                return Surface::Unavailable(format!("{} is not a post surface", target.label()));
            }
        };

        info!(target = %target.label(), url = %url, "Navigating");
        if let Err(e) = self.page.goto(&url, NAV_TIMEOUT).await {
            warn!(url = %url, error = %e, "Navigation failed");
            return Surface::Unavailable(format!("navigation failed: {}", e));
        }
        self.pacer.wait(3000).await;
        self.handle_popup().await;
        self.audit
            .capture(self.page.as_ref(), "navigation", &target.label())
            .await;

        if !target.is_single_post_view() {
            return Surface::Ready;
        }
        self.open_first_post(target).await
    }

    async fn open_first_post(&self, target: &Target) -> Surface {
        let page = self.page.as_ref();
        let present = page
            .wait_for(POST_LINKS, Duration::from_secs(10))
            .await
            .unwrap_or(false);
        if !present {
            info!(target = %target.label(), "No posts found");
            if matches!(target, Target::Explore) {
                self.audit.capture(page, "diagnostics", "explore-no-posts").await;
            }
            return Surface::Unavailable("no posts found".to_string());
        }

        let mut locator = Locator::new("first post")
            .css("a[href*=\"/p/\"]")
            .css("a[href*=\"/reel/\"]");
        if matches!(target, Target::Explore) {
            locator = locator
                .css("article a[role=\"link\"]")
                .css("div[role=\"button\"] a");
        }

        match locator.click(page).await {
            Ok(true) => {}
            Ok(false) => return Surface::Unavailable("no clickable post".to_string()),
            Err(e) => return Surface::Unavailable(format!("opening first post failed: {}", e)),
        }

        self.pacer.wait(4000).await;
        self.handle_popup().await;
        Surface::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_builder, FakePage};

    #[tokio::test]
    async fn test_feed_stays_on_home() {
        let page = FakePage::new("about:blank");
        let session = session_builder(&page).build();

        assert_eq!(session.navigate(&Target::Feed).await, Surface::Ready);
        assert_eq!(page.visited(), vec![site_url("")]);
    }

    #[tokio::test]
    async fn test_hashtag_opens_first_post() {
        let page = FakePage::new("about:blank");
        page.on_goto("https://www.instagram.com/explore/tags/pizza/", |dom| {
            dom.set_text(POST_LINKS, "");
            dom.set_text("a[href*=\"/reel/\"]", "");
        });
        let session = session_builder(&page).build();

        let surface = session.navigate(&Target::Hashtag("pizza".to_string())).await;

        assert_eq!(surface, Surface::Ready);
        assert_eq!(page.clicks_on("a[href*=\"/reel/\"]"), 1);
    }

    #[tokio::test]
    async fn test_private_profile_unavailable() {
        let page = FakePage::new("about:blank");
        let session = session_builder(&page).build();

        let surface = session.navigate(&Target::User("private.person".to_string())).await;

        assert_eq!(surface, Surface::Unavailable("no posts found".to_string()));
        assert_eq!(page.visited(), vec![profile_url("private.person")]);
    }

    #[tokio::test]
    async fn test_unresolvable_location() {
        let page = FakePage::new("about:blank");
        let session = session_builder(&page).build();
        let target = Target::Location(LocationTarget::Query {
            query: "atlantis".to_string(),
            coordinates: None,
        });

        match session.navigate(&target).await {
            Surface::Unavailable(reason) => assert!(reason.contains("atlantis")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
