use std::time::Duration;

use tracing::{debug, info, warn};

use autoengage_protocols::{Page, PageError};

use super::ProfileInspectionResult;
use crate::session::Session;

const HEADER_TEXT: &str = "header h1, header h2, header span, header div";

/// Last non-empty path segment of a profile URL.
pub fn username_from_url(url: &str) -> Option<String> {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

impl Session {
    /// Inspect a profile on a secondary page.
    ///
    /// The secondary page is closed on every path. Any failure approves the
    /// profile.
    pub async fn inspect_profile(
        &self,
        profile_url: &str,
        required_keywords: &[String],
    ) -> ProfileInspectionResult {
        let page = match self.browser.new_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(profile_url, error = %e, "Cannot open inspection page, approving");
                return ProfileInspectionResult::pass_through();
            }
        };

        let result = self
            .inspect_on(page.as_ref(), profile_url, required_keywords)
            .await;

        if let Err(e) = page.close().await {
            debug!(error = %e, "Inspection page close failed");
        }

        match result {
            Ok(result) => result,
            Err(e) => {
                warn!(profile_url, error = %e, "Profile inspection failed, approving");
                ProfileInspectionResult::pass_through()
            }
        }
    }

    async fn inspect_on(
        &self,
        page: &dyn Page,
        profile_url: &str,
        required_keywords: &[String],
    ) -> Result<ProfileInspectionResult, PageError> {
        page.goto(profile_url, Duration::from_secs(25)).await?;
        self.pacer.wait(1500).await;

        let bio = page
            .query_all(HEADER_TEXT)
            .await?
            .into_iter()
            .map(|el| el.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let username = username_from_url(profile_url).unwrap_or_else(|| "profile".to_string());
        let screenshot = self
            .audit
            .capture_full(page, "profile-screens", &username)
            .await;

        let category = self.classifier.classify(&bio);
        let approved = self.classifier.approves(category, &bio, required_keywords);
        if approved {
            info!(username = %username, category = %category, "Profile approved");
        } else {
            info!(username = %username, category = %category, "Profile rejected");
        }

        Ok(ProfileInspectionResult {
            approved,
            category: Some(category),
            username: Some(username),
            profile_url: Some(profile_url.to_string()),
            bio: Some(bio),
            screenshot,
        })
    }
}
