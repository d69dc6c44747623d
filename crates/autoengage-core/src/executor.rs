//! Interaction executor: like, comment, persist, and optionally hand off to
//! lead outreach.

use std::time::Duration;

use base64::Engine as _;
use tracing::{debug, info, warn};

use autoengage_protocols::{
    CommentSuggestion, CommentedPostRecord, GenerationRequest, ImagePayload, PageError,
    comment_schema,
};

use crate::audit::OverlayTone;
use crate::dm::OutreachOutcome;
use crate::error::EngineError;
use crate::filters::{Candidate, Evaluation};
use crate::locator::{tolerable, Locator};
use crate::navigator::profile_url;
use crate::options::InteractionOptions;
use crate::profile::ProfileInspectionResult;
use crate::prompts::comment_prompt;
use crate::session::Session;

/// What the executor did for one candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngageOutcome {
    pub liked: bool,
    pub commented: bool,
    pub outreach: Option<OutreachOutcome>,
}

impl EngageOutcome {
    pub fn dm_sent(&self) -> bool {
        self.outreach == Some(OutreachOutcome::Sent)
    }
}

fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

impl Session {
    /// Engage with a candidate that passed the filter pipeline.
    pub async fn engage(
        &mut self,
        candidate: &Candidate,
        eval: &Evaluation,
        options: &InteractionOptions,
    ) -> Result<EngageOutcome, EngineError> {
        let post = candidate.selector.as_str();
        let mut outcome = EngageOutcome::default();

        if self.pacer.rng().chance(self.settings.engine.like_skip_probability) {
            info!(index = candidate.index, "Withholding like on this post");
        } else {
            outcome.liked = self.like_post(post).await?;
        }

        let mut caption = eval.caption.as_ref().map(|c| c.text.clone());
        if caption.is_some() {
            if let Some(expanded) = self.expand_caption(post).await? {
                caption = Some(expanded);
            }
        }
        let caption = match caption {
            Some(text) => text,
            None => self.image_alt_text(post).await?.unwrap_or_default(),
        };

        let video_url = if eval.is_video {
            self.pacer.wait(2000).await;
            self.video_source(post).await
        } else {
            None
        };

        match self
            .generate_comment(post, &caption, eval.is_video, video_url.as_deref())
            .await
        {
            Some(comment) => {
                outcome.commented = self.submit_comment(candidate, &comment).await?;
            }
            None => info!(index = candidate.index, "No comment generated, leaving post"),
        }

        // Outreach only follows a posted comment.
        if options.send_dms && outcome.commented {
            outcome.outreach = self.maybe_outreach(eval, options, &caption).await;
        }

        Ok(outcome)
    }

    async fn like_post(&self, post: &str) -> Result<bool, PageError> {
        let page = self.page.as_ref();
        let like = format!("{} svg[aria-label=\"Like\"]", post);
        if !page.exists(&like).await? {
            if page.exists(&format!("{} svg[aria-label=\"Unlike\"]", post)).await? {
                debug!("Post already liked");
            } else {
                warn!("Like button not found");
            }
            return Ok(false);
        }

        self.pacer.delay(500, 1500).await;
        match page.click(&like).await {
            Ok(()) => {
                info!("Liked post");
                Ok(true)
            }
            Err(e) if tolerable(&e) => {
                warn!(error = %e, "Like click failed");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn video_source(&self, post: &str) -> Option<String> {
        let script = format!(
            "(() => {{ const v = document.querySelector({}); return v ? (v.currentSrc || v.src || null) : null; }})()",
            js_str(&format!("{} video", post))
        );
        match self.page.evaluate(&script).await {
            Ok(value) => value
                .as_str()
                .map(str::to_string)
                .filter(|src| !src.is_empty() && !src.starts_with("blob:")),
            Err(e) => {
                debug!(error = %e, "Cannot read video source");
                None
            }
        }
    }

    async fn thumbnail(&self, post: &str) -> Option<ImagePayload> {
        match self
            .page
            .screenshot(Some(&format!("{} img[alt]", post)), false)
            .await
        {
            Ok(bytes) => Some(ImagePayload::png(
                base64::engine::general_purpose::STANDARD.encode(bytes),
            )),
            Err(e) => {
                debug!(error = %e, "No thumbnail for comment generation");
                None
            }
        }
    }

    /// Ask the generator for a comment.
    ///
    /// Empty, malformed or failed generation yields `None` and the post is
    /// left without a comment. No fallback text is ever posted.
    async fn generate_comment(
        &self,
        post: &str,
        caption: &str,
        is_video: bool,
        video_url: Option<&str>,
    ) -> Option<String> {
        let mut request =
            GenerationRequest::new(comment_schema(), comment_prompt(caption, is_video, video_url));
        if let Some(image) = self.thumbnail(post).await {
            request = request.with_image(image);
        }

        match self.generator.generate(request).await {
            Ok(value) => {
                let text = CommentSuggestion::first_text(&value);
                if text.is_none() {
                    warn!(generator = self.generator.id(), "Generator returned no usable comment");
                }
                text
            }
            Err(e) => {
                warn!(generator = self.generator.id(), error = %e, "Comment generation failed");
                None
            }
        }
    }

    async fn submit_comment(
        &mut self,
        candidate: &Candidate,
        comment: &str,
    ) -> Result<bool, EngineError> {
        let page = self.page.clone();
        let post = candidate.selector.as_str();

        let box_locator = Locator::new("comment box")
            .css(format!("{} textarea", post))
            .css("form textarea");
        let Some(comment_box) = box_locator
            .wait_locate(page.as_ref(), Duration::from_secs(5))
            .await?
        else {
            warn!(index = candidate.index, "Comment box not found");
            return Ok(false);
        };
        comment_box.click(page.as_ref()).await?;
        self.pacer.type_like_human(page.as_ref(), comment).await?;

        let post_button = Locator::new("post button")
            .enabled_text(format!("{} div[role=\"button\"]", post), &["Post"])
            .enabled_text("div[role=\"button\"]", &["Post"]);
        if !post_button.click(page.as_ref()).await? {
            warn!(index = candidate.index, "Post button not found or disabled");
            return Ok(false);
        }
        info!(index = candidate.index, permalink = %candidate.permalink, comment, "Comment posted");

        self.mark_commented(&candidate.permalink);
        self.record_comment(candidate).await;

        self.pacer.wait(2000).await;
        self.audit
            .overlay(page.as_ref(), "Comment posted", OverlayTone::Success)
            .await;
        Ok(true)
    }

    async fn record_comment(&self, candidate: &Candidate) {
        if candidate.synthesized {
            debug!(permalink = %candidate.permalink, "Synthesized identifier, not persisted");
            return;
        }
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let record = CommentedPostRecord::new(&candidate.permalink, &self.settings.username);
        match store.insert(record).await {
            Ok(()) => debug!(permalink = %candidate.permalink, "Comment recorded"),
            Err(e) if e.is_duplicate() => {
                info!(permalink = %candidate.permalink, "Comment already recorded")
            }
            Err(e) => warn!(permalink = %candidate.permalink, error = %e, "Cannot record comment"),
        }
    }

    async fn maybe_outreach(
        &mut self,
        eval: &Evaluation,
        options: &InteractionOptions,
        caption: &str,
    ) -> Option<OutreachOutcome> {
        let cap = options.outbound_dm_cap(self.settings.engine.max_outbound_dms);
        if self.outbound_dms() >= cap {
            debug!(cap, "Outbound DM cap reached");
            return None;
        }

        let profile = match (&eval.profile, eval.author.as_deref()) {
            (Some(profile), _) => profile.clone(),
            (None, Some(author)) => {
                self.inspect_profile(&profile_url(author), &options.required_bio_keywords)
                    .await
            }
            (None, None) => return None,
        };
        if !qualifies_for_outreach(&profile) {
            debug!(category = ?profile.category, "Profile does not qualify for outreach");
            return None;
        }
        let username = profile.username.clone().or_else(|| eval.author.clone())?;

        let return_url = match self.page.current_url().await {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(error = %e, "Cannot read current URL before outreach");
                None
            }
        };
        let caption = (!caption.trim().is_empty()).then_some(caption);
        let outcome = self
            .send_outreach(&username, profile.bio.as_deref(), caption, return_url.as_deref())
            .await;
        if outcome == OutreachOutcome::Sent {
            self.count_outbound_dm();
            info!(username = %username, sent = self.outbound_dms(), cap, "Outreach DM sent");
        }
        Some(outcome)
    }
}

fn qualifies_for_outreach(profile: &ProfileInspectionResult) -> bool {
    profile.approved && profile.is_restaurant()
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
