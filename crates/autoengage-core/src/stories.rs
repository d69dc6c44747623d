//! Story viewer walk.

use serde::Serialize;
use tracing::{debug, info, warn};

use autoengage_protocols::{CancellationSource, PageError};

use crate::audit::OverlayTone;
use crate::error::EngineError;
use crate::locator::{tolerable, Locator};
use crate::navigator::profile_url;
use crate::options::{StoryOptions, StoryPlan};
use crate::session::{Session, NAV_TIMEOUT};
use crate::site_url;

const VIEWER: &str = "section div[role=\"dialog\"], div[role=\"dialog\"] section";

const TRIGGERS: &[&str] = &[
    "div[role=\"button\"][aria-label*=\"Story\"]",
    "header div[role=\"button\"] canvas",
    "button[aria-label*=\"story\"]",
    "div[role=\"menu\"] canvas",
];

const STORY_LINK_FALLBACK: &str = r#"(() => {
  const link = document.querySelector('a[href^="/stories/"]');
  if (!link) return false;
  link.click();
  return true;
})()"#;

/// Summary of one story walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoryReport {
    /// Whether a viewer could be opened at all.
    pub available: bool,
    pub viewed: usize,
    pub like_attempts: usize,
    pub liked: usize,
    pub reacted: usize,
    /// Advancing closed the viewer before the requested count.
    pub ended_early: bool,
}

fn like_control() -> Locator {
    Locator::new("story like")
        .css("button[aria-label=\"Like\"]")
        .css("div[role=\"button\"][aria-label=\"Like\"]")
        .css("svg[aria-label=\"Like\"]")
}

fn reply_input() -> Locator {
    Locator::new("story reply")
        .css("textarea[placeholder*=\"Reply\"]")
        .css("input[placeholder*=\"Reply\"]")
        .css("div[role=\"textbox\"][contenteditable=\"true\"]")
}

fn next_control() -> Locator {
    Locator::new("story next")
        .css("button[aria-label=\"Next\"]")
        .css("div[role=\"button\"][aria-label=\"Next\"]")
        .css("svg[aria-label=\"Next\"]")
}

impl Session {
    /// Watch up to the planned number of stories, liking or reacting on the
    /// way. `username` targets one account; `None` uses the home tray.
    pub async fn walk_stories(
        &self,
        username: Option<&str>,
        options: &StoryOptions,
        cancel: &dyn CancellationSource,
    ) -> Result<StoryReport, EngineError> {
        let plan = StoryPlan::from_options(options);
        let page = self.page.as_ref();
        let mut report = StoryReport::default();

        let source = username.map(profile_url).unwrap_or_else(|| site_url(""));
        page.goto(&source, NAV_TIMEOUT).await?;
        self.pacer.wait(3000).await;
        self.handle_popup().await;

        if !self.ensure_viewer_open(username).await? {
            info!(source = %source, "No stories available");
            return Ok(report);
        }
        report.available = true;
        info!(count = plan.count, "Story viewer open");

        for index in 0..plan.count {
            if cancel.should_stop() {
                info!(viewed = report.viewed, "Story walk cancelled");
                break;
            }

            let rng = self.pacer.rng();
            let watch = rng
                .between(plan.min_watch_ms as f64, plan.max_watch_ms as f64)
                .floor() as u64;
            self.pacer
                .human_pause(page, watch.saturating_sub(1500).max(1500), watch + 500)
                .await;
            report.viewed += 1;

            if rng.chance(plan.like_probability) {
                report.like_attempts += 1;
                if like_control().click(page).await? {
                    report.liked += 1;
                    debug!(story = index + 1, "Liked story");
                    self.pacer.wait(600).await;
                }
            } else if rng.chance(plan.reaction_probability) && self.react(&plan.reaction_text).await? {
                report.reacted += 1;
                debug!(story = index + 1, "Reacted to story");
            }

            if index + 1 == plan.count {
                break;
            }
            if !self.advance_story().await? {
                info!(viewed = report.viewed, "Story viewer closed, ending early");
                report.ended_early = true;
                break;
            }
            self.pacer.wait(1200).await;
        }

        self.audit
            .overlay(
                page,
                &format!("Stories viewed: {}", report.viewed),
                OverlayTone::Info,
            )
            .await;
        if let Err(e) = page.press_key("Escape").await {
            debug!(error = %e, "Escape after stories failed");
        }
        info!(
            viewed = report.viewed,
            liked = report.liked,
            reacted = report.reacted,
            "Story walk finished"
        );
        Ok(report)
    }

    async fn viewer_open(&self) -> Result<bool, PageError> {
        self.page.exists(VIEWER).await
    }

    async fn ensure_viewer_open(&self, username: Option<&str>) -> Result<bool, PageError> {
        let page = self.page.as_ref();
        if self.viewer_open().await? {
            return Ok(true);
        }

        if let Some(username) = username {
            page.goto(&site_url(&format!("stories/{}/", username)), NAV_TIMEOUT)
                .await?;
            self.pacer.wait(2500).await;
            if self.viewer_open().await? {
                return Ok(true);
            }
        }

        for trigger in TRIGGERS {
            if !page.exists(trigger).await? {
                continue;
            }
            match page.click(trigger).await {
                Ok(()) => {}
                Err(e) if tolerable(&e) => continue,
                Err(e) => return Err(e),
            }
            self.pacer.wait(2500).await;
            if self.viewer_open().await? {
                return Ok(true);
            }
        }

        match page.evaluate(STORY_LINK_FALLBACK).await {
            Ok(serde_json::Value::Bool(true)) => {
                self.pacer.wait(2500).await;
                self.viewer_open().await
            }
            Ok(_) => Ok(false),
            Err(e) if tolerable(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn react(&self, text: &str) -> Result<bool, PageError> {
        let page = self.page.as_ref();
        let Some(input) = reply_input().locate(page).await? else {
            debug!("No story reply box");
            return Ok(false);
        };
        input.click(page).await?;
        self.pacer.wait(200).await;
        self.pacer.type_steady(page, text, 120).await?;
        self.pacer.wait(200).await;
        page.press_key("Enter").await?;
        self.pacer.wait(400).await;
        Ok(true)
    }

    /// Move to the next story. Returns whether the viewer is still open.
    async fn advance_story(&self) -> Result<bool, PageError> {
        let page = self.page.as_ref();
        if !next_control().click(page).await? {
            let viewport = page.viewport().await?;
            let x = (viewport.width - 30.0).max(1.0);
            if let Err(e) = page.click_at(x, viewport.height / 2.0).await {
                warn!(error = %e, "Right-edge advance failed");
            }
        }
        self.pacer.wait(1500).await;
        self.viewer_open().await
    }
}
