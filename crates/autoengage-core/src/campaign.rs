//! Candidate selection loop.
//!
//! [`Session::interact_with_posts`] resolves the target once, puts the page
//! on the surface and walks candidates from index 1 up to the bound. Each
//! candidate goes through [`Session::evaluate`] and, when it passes,
//! [`Session::engage`]. Any error inside a candidate ends the run.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

use autoengage_protocols::{CancellationSource, PageError};

use crate::error::EngineError;
use crate::executor::EngageOutcome;
use crate::filters::{Candidate, SkipReason, ThresholdGovernor};
use crate::locator::Locator;
use crate::navigator::Surface;
use crate::options::{InteractionOptions, StoryOptions, DEFAULT_MAX_POSTS};
use crate::session::Session;
use crate::stories::StoryReport;
use crate::target::{InteractionMode, Target};
use crate::BASE_URL;

const SINGLE_VIEW_POST: &str = "article:nth-of-type(1)";

/// Why a campaign stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// The bound was reached.
    Completed,
    Cancelled,
    /// No candidate at the next index.
    Exhausted,
    /// Single-post view without a Next control.
    NoNextControl,
    Unavailable(String),
    LoopError(String),
}

/// Summary of one campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignReport {
    pub mode: InteractionMode,
    pub target: String,
    pub attempted: usize,
    pub interacted: usize,
    pub liked: usize,
    pub commented: usize,
    pub skipped: BTreeMap<String, usize>,
    pub dms_sent: usize,
    pub relaxations: u32,
    pub stop: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<StoryReport>,
}

impl CampaignReport {
    fn new(mode: InteractionMode, target: impl Into<String>) -> Self {
        Self {
            mode,
            target: target.into(),
            attempted: 0,
            interacted: 0,
            liked: 0,
            commented: 0,
            skipped: BTreeMap::new(),
            dms_sent: 0,
            relaxations: 0,
            stop: StopReason::Completed,
            stories: None,
        }
    }

    fn for_target(target: &Target) -> Self {
        Self::new(target.mode(), target.label())
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    fn skip(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.key().to_string()).or_default() += 1;
    }

    fn record(&mut self, outcome: &EngageOutcome) {
        self.interacted += 1;
        self.liked += usize::from(outcome.liked);
        self.commented += usize::from(outcome.commented);
        self.dms_sent += usize::from(outcome.dm_sent());
    }

    /// Fold a per-follower run into this one.
    fn absorb(&mut self, other: &CampaignReport) {
        self.attempted += other.attempted;
        self.interacted += other.interacted;
        self.liked += other.liked;
        self.commented += other.commented;
        self.dms_sent += other.dms_sent;
        self.relaxations += other.relaxations;
        for (key, count) in &other.skipped {
            *self.skipped.entry(key.clone()).or_default() += count;
        }
    }
}

/// Absolute permalink for a post href, without query or fragment.
pub fn canonical_permalink(href: &str) -> Option<String> {
    let mut url = Url::parse(BASE_URL).ok()?.join(href.trim()).ok()?;
    if !is_post_path(url.path()) {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

fn is_post_path(path: &str) -> bool {
    path.contains("/p/") || path.contains("/reel/")
}

/// Story options for a campaign: the story count never exceeds `max_posts`.
fn bounded_story_options(stories: &StoryOptions, max_posts: usize) -> StoryOptions {
    StoryOptions {
        count: Some(stories.count.map_or(max_posts, |count| count.min(max_posts))),
        ..stories.clone()
    }
}

fn without_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

impl Session {
    /// Run a campaign against `target` for up to `max_posts` candidates
    /// (15 when `None`).
    pub async fn interact_with_posts(
        &mut self,
        target: Option<&str>,
        max_posts: Option<usize>,
        options: &InteractionOptions,
        cancel: &dyn CancellationSource,
    ) -> CampaignReport {
        let max_posts = max_posts.unwrap_or(DEFAULT_MAX_POSTS);
        let resolved = Target::resolve(target, options, max_posts, self.pacer.rng().as_ref());
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                let mode = options.mode.unwrap_or_else(|| InteractionMode::infer(target));
                warn!(mode = %mode, error = %e, "Cannot resolve target");
                let mut report = CampaignReport::new(mode, target.unwrap_or_default().trim());
                report.stop = StopReason::Unavailable(e.to_string());
                return report;
            }
        };

        info!(target = %resolved.label(), max_posts, "Starting campaign");
        let report = match &resolved {
            Target::Stories { username } => {
                self.story_campaign(&resolved, username.as_deref(), max_posts, options, cancel)
                    .await
            }
            Target::CompetitorFollowers {
                account,
                followers,
                posts_per_follower,
            } => {
                self.follower_campaign(&resolved, account, *followers, *posts_per_follower, options, cancel)
                    .await
            }
            _ => self.run_post_surface(&resolved, max_posts, options, cancel).await,
        };

        info!(
            target = %report.target,
            attempted = report.attempted,
            interacted = report.interacted,
            commented = report.commented,
            skipped = report.skipped_total(),
            dms_sent = report.dms_sent,
            stop = ?report.stop,
            "Campaign finished"
        );
        report
    }

    async fn story_campaign(
        &self,
        target: &Target,
        username: Option<&str>,
        max_posts: usize,
        options: &InteractionOptions,
        cancel: &dyn CancellationSource,
    ) -> CampaignReport {
        let mut report = CampaignReport::for_target(target);
        if max_posts == 0 {
            return report;
        }
        let stories = bounded_story_options(&options.stories, max_posts);
        match self.walk_stories(username, &stories, cancel).await {
            Ok(stories) => {
                if !stories.available {
                    report.stop = StopReason::Unavailable("no stories available".to_string());
                } else if cancel.should_stop() {
                    report.stop = StopReason::Cancelled;
                }
                report.stories = Some(stories);
            }
            Err(e) => {
                error!(target = %report.target, error = %e, "Story walk aborted");
                report.stop = StopReason::LoopError(e.to_string());
            }
        }
        report
    }

    /// One single-post run per scraped follower. A failing follower does
    /// not stop the others.
    async fn follower_campaign(
        &mut self,
        target: &Target,
        account: &str,
        followers: usize,
        posts_per_follower: usize,
        options: &InteractionOptions,
        cancel: &dyn CancellationSource,
    ) -> CampaignReport {
        let mut report = CampaignReport::for_target(target);
        let usernames = match self.scrape_followers(account, followers).await {
            Ok(usernames) if usernames.is_empty() => {
                report.stop = StopReason::Unavailable("no followers found".to_string());
                return report;
            }
            Ok(usernames) => usernames,
            Err(e) => {
                warn!(account, error = %e, "Follower scrape failed");
                report.stop = StopReason::Unavailable(format!("follower scrape failed: {}", e));
                return report;
            }
        };

        for (n, follower) in usernames.iter().enumerate() {
            if cancel.should_stop() {
                info!(done = n, "Follower campaign cancelled");
                report.stop = StopReason::Cancelled;
                break;
            }
            info!(follower = %follower, n = n + 1, of = usernames.len(), "Engaging follower");
            let sub = self
                .run_post_surface(&Target::User(follower.clone()), posts_per_follower, options, cancel)
                .await;
            report.absorb(&sub);
            match sub.stop {
                StopReason::Cancelled => {
                    report.stop = StopReason::Cancelled;
                    break;
                }
                StopReason::Unavailable(reason) => {
                    debug!(follower = %follower, reason = %reason, "Follower has nothing to engage");
                }
                _ => {}
            }
        }
        report
    }

    async fn run_post_surface(
        &mut self,
        target: &Target,
        max_posts: usize,
        options: &InteractionOptions,
        cancel: &dyn CancellationSource,
    ) -> CampaignReport {
        let mut report = CampaignReport::for_target(target);
        if let Surface::Unavailable(reason) = self.navigate(target).await {
            info!(target = %report.target, reason = %reason, "Surface unavailable");
            report.stop = StopReason::Unavailable(reason);
            return report;
        }

        let mut governor = ThresholdGovernor::new(options.engagement, &self.settings.engine);
        let single_view = target.is_single_post_view();

        for index in 1..=max_posts {
            if cancel.should_stop() {
                info!(index, "Campaign cancelled");
                report.stop = StopReason::Cancelled;
                break;
            }

            match self
                .process_candidate(index, single_view, options, &mut governor, &mut report)
                .await
            {
                Ok(None) => {}
                Ok(Some(stop)) => {
                    report.stop = stop;
                    break;
                }
                Err(e) => {
                    error!(index, target = %report.target, error = %e, "Candidate failed, aborting campaign");
                    report.stop = StopReason::LoopError(e.to_string());
                    break;
                }
            }

            if index == max_posts {
                break;
            }
            match self.advance(single_view).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(index, "No Next control, ending campaign");
                    report.stop = StopReason::NoNextControl;
                    break;
                }
                Err(e) => {
                    error!(index, error = %e, "Advancing failed, aborting campaign");
                    report.stop = StopReason::LoopError(e.to_string());
                    break;
                }
            }
        }

        report.relaxations = governor.relaxations();
        report
    }

    /// Returns a stop reason when the loop should end.
    async fn process_candidate(
        &mut self,
        index: usize,
        single_view: bool,
        options: &InteractionOptions,
        governor: &mut ThresholdGovernor,
        report: &mut CampaignReport,
    ) -> Result<Option<StopReason>, EngineError> {
        let page = self.page.clone();
        let selector = if single_view {
            SINGLE_VIEW_POST.to_string()
        } else {
            format!("article:nth-of-type({})", index)
        };

        if !page.exists(&selector).await? {
            info!(index, "No post at this position");
            self.audit
                .capture(page.as_ref(), "diagnostics", &format!("no-posts-index-{}", index))
                .await;
            return Ok(Some(StopReason::Exhausted));
        }
        report.attempted += 1;

        let every = self.settings.engine.screenshot_every.max(1);
        if (index - 1) % every == 0 {
            self.audit
                .capture(page.as_ref(), "posts", &format!("post-{}", index))
                .await;
        }

        let rng = self.pacer.rng().clone();
        let x = 100.0 + (rng.next_f64() * 200.0).floor();
        let y = 100.0 + (rng.next_f64() * 200.0).floor();
        if let Err(e) = page.mouse_move(x, y).await {
            debug!(error = %e, "Mouse move failed");
        }
        self.pacer.delay(200, 700).await;

        let candidate = self.candidate(index, selector, single_view).await?;
        let eval = self.evaluate(&candidate, options, governor).await?;

        match eval.skip_reason() {
            Some(reason) => {
                info!(index, permalink = %candidate.permalink, reason = %reason, "Skipping post");
                report.skip(reason);
                if reason.is_threshold() {
                    governor.record_threshold_skip();
                } else {
                    governor.record_other();
                }
            }
            None => {
                governor.record_other();
                let outcome = self.engage(&candidate, &eval, options).await?;
                report.record(&outcome);
            }
        }

        if !matches!(eval.skip_reason(), Some(SkipReason::ProfileNotApproved { .. })) {
            let engine = &self.settings.engine;
            let (min, max) = (engine.post_pause_min_ms, engine.post_pause_max_ms);
            self.pacer.human_pause(page.as_ref(), min, max).await;
        }
        Ok(None)
    }

    /// Identify the candidate. Falls back to a synthesized identifier when
    /// no permalink is visible.
    async fn candidate(
        &self,
        index: usize,
        selector: String,
        single_view: bool,
    ) -> Result<Candidate, PageError> {
        let page = self.page.as_ref();
        let current = page.current_url().await?;

        let permalink = if single_view {
            canonical_permalink(&current)
        } else {
            let links = Locator::new("post permalink")
                .css(format!("{} a[href*=\"/p/\"]", selector))
                .css(format!("{} a[href*=\"/reel/\"]", selector));
            links
                .locate(page)
                .await?
                .and_then(|found| found.element.attr("href").and_then(canonical_permalink))
        };

        let (permalink, synthesized) = match permalink {
            Some(permalink) => (permalink, false),
            None => {
                let synthesized = format!(
                    "{}?postIndex={}&ts={}",
                    without_query(&current),
                    index,
                    self.pacer.clock().now_millis()
                );
                warn!(index, id = %synthesized, "No permalink found, using a synthesized identifier");
                (synthesized, true)
            }
        };

        Ok(Candidate {
            index,
            selector,
            permalink,
            synthesized,
        })
    }

    /// Move to the next candidate. Returns false when a single-post view
    /// has no Next control.
    async fn advance(&self, single_view: bool) -> Result<bool, PageError> {
        let page = self.page.as_ref();
        if single_view {
            let next = Locator::new("next post")
                .css("button[aria-label=\"Next\"]")
                .css("svg[aria-label=\"Next\"]");
            if !next.click(page).await? {
                return Ok(false);
            }
            self.pacer.wait(3000).await;
        } else {
            let viewport = page.viewport().await?;
            page.scroll_by(viewport.height).await?;
            self.pacer.wait(2000).await;
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "campaign_tests.rs"]
mod tests;
