//! Ordered per-candidate filter pipeline.
//!
//! Checks run cheapest first and stop at the first failure:
//! engagement thresholds, dedup, author profile, existing own comment,
//! caption presence, caption language, media type.

use std::fmt;

use tracing::{debug, info, warn};

use autoengage_protocols::PageError;

use super::ThresholdGovernor;
use crate::caption::Caption;
use crate::error::EngineError;
use crate::metrics::EngagementMetrics;
use crate::navigator::profile_url;
use crate::options::InteractionOptions;
use crate::profile::{username_from_url, ProfileCategory, ProfileInspectionResult};
use crate::session::Session;

/// Why a candidate was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    LikesBelow { actual: Option<u64>, min: u64 },
    CommentsBelow { actual: Option<u64>, min: u64 },
    DuplicateInSession,
    PreviouslyCommented { at: String },
    ProfileNotApproved { category: Option<ProfileCategory> },
    AlreadyCommented,
    MissingCaption,
    NonEnglish,
    VideoPost,
}

impl SkipReason {
    /// Stable key used for report tallies.
    pub fn key(&self) -> &'static str {
        match self {
            SkipReason::LikesBelow { .. } => "likes_below",
            SkipReason::CommentsBelow { .. } => "comments_below",
            SkipReason::DuplicateInSession => "duplicate_in_session",
            SkipReason::PreviouslyCommented { .. } => "previously_commented",
            SkipReason::ProfileNotApproved { .. } => "profile_not_approved",
            SkipReason::AlreadyCommented => "already_commented",
            SkipReason::MissingCaption => "missing_caption",
            SkipReason::NonEnglish => "non_english",
            SkipReason::VideoPost => "video_post",
        }
    }

    /// Whether this skip counts toward threshold relaxation.
    pub fn is_threshold(&self) -> bool {
        matches!(
            self,
            SkipReason::LikesBelow { .. } | SkipReason::CommentsBelow { .. }
        )
    }
}

fn count_or_unknown(value: &Option<u64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LikesBelow { actual, min } => {
                write!(f, "likes {} < {}", count_or_unknown(actual), min)
            }
            SkipReason::CommentsBelow { actual, min } => {
                write!(f, "comments {} < {}", count_or_unknown(actual), min)
            }
            SkipReason::DuplicateInSession => write!(f, "duplicate in this session"),
            SkipReason::PreviouslyCommented { at } => write!(f, "previously commented {}", at),
            SkipReason::ProfileNotApproved { category } => match category {
                Some(c) => write!(f, "profile not approved ({})", c),
                None => write!(f, "profile not approved"),
            },
            SkipReason::AlreadyCommented => write!(f, "already commented"),
            SkipReason::MissingCaption => write!(f, "missing caption"),
            SkipReason::NonEnglish => write!(f, "non-English caption detected"),
            SkipReason::VideoPost => write!(f, "video post"),
        }
    }
}

/// One post considered for engagement.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// 1-based position within the campaign.
    pub index: usize,
    /// Selector of the post container.
    pub selector: String,
    pub permalink: String,
    /// True when no real permalink could be found.
    pub synthesized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Skip(SkipReason),
}

/// Everything the pipeline learned about a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub metrics: EngagementMetrics,
    pub author: Option<String>,
    pub profile: Option<ProfileInspectionResult>,
    pub caption: Option<Caption>,
    pub is_video: bool,
}

impl Evaluation {
    fn new(metrics: EngagementMetrics) -> Self {
        Self {
            verdict: Verdict::Pass,
            metrics,
            author: None,
            profile: None,
            caption: None,
            is_video: false,
        }
    }

    fn skip(mut self, reason: SkipReason) -> Self {
        self.verdict = Verdict::Skip(reason);
        self
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.verdict {
            Verdict::Skip(reason) => Some(reason),
            Verdict::Pass => None,
        }
    }
}

const AUTHOR_LINK: &str = "header a";
const COMMENT_ROWS: &str = "ul li";
const COMMENT_AUTHOR: &str = "a[href^=\"/\"]";
const VIDEO: &str = "video";

impl Session {
    /// Run the filter pipeline for one candidate.
    pub async fn evaluate(
        &mut self,
        candidate: &Candidate,
        options: &InteractionOptions,
        governor: &ThresholdGovernor,
    ) -> Result<Evaluation, EngineError> {
        let post = candidate.selector.as_str();
        let page = self.page.clone();

        let post_text = page.query(post).await?.map(|el| el.text).unwrap_or_default();
        let mut eval = Evaluation::new(EngagementMetrics::from_text(&post_text));
        debug!(
            index = candidate.index,
            likes = ?eval.metrics.likes,
            comments = ?eval.metrics.comments,
            "Post metrics"
        );

        if let Some(reason) = governor.check(&eval.metrics) {
            return Ok(eval.skip(reason));
        }

        if let Some(reason) = self.dedup(&candidate.permalink).await {
            return Ok(eval.skip(reason));
        }

        eval.author = self.post_author(post).await?;
        if options.inspect_profile {
            if let Some(author) = eval.author.as_deref() {
                let profile = self
                    .inspect_profile(&profile_url(author), &options.required_bio_keywords)
                    .await;
                let approved = profile.approved;
                let category = profile.category;
                eval.profile = Some(profile);
                if !approved {
                    return Ok(eval.skip(SkipReason::ProfileNotApproved { category }));
                }
            }
        }

        if !self.settings.username.is_empty() && self.has_own_comment(post).await? {
            return Ok(eval.skip(SkipReason::AlreadyCommented));
        }

        eval.caption = self.extract_caption(post).await?;
        if options.require_caption && eval.caption.is_none() {
            return Ok(eval.skip(SkipReason::MissingCaption));
        }

        if options.english_only {
            let text = match &eval.caption {
                Some(caption) => Some(caption.text.clone()),
                None => self.image_alt_text(post).await?,
            };
            if !self.language.is_acceptable(text.as_deref()) {
                return Ok(eval.skip(SkipReason::NonEnglish));
            }
        }

        eval.is_video = page.exists(&format!("{} {}", post, VIDEO)).await?;
        if options.images_only && eval.is_video {
            return Ok(eval.skip(SkipReason::VideoPost));
        }

        Ok(eval)
    }

    /// Session set first, then the persistent store. A store failure
    /// degrades to session-only dedup.
    async fn dedup(&mut self, permalink: &str) -> Option<SkipReason> {
        if self.is_commented(permalink) {
            return Some(SkipReason::DuplicateInSession);
        }
        let store = self.store.clone()?;
        match store.find(permalink).await {
            Ok(Some(record)) => {
                info!(permalink, at = %record.commented_at, "Already commented in an earlier run");
                self.mark_commented(permalink);
                Some(SkipReason::PreviouslyCommented {
                    at: record.commented_at.format("%Y-%m-%d %H:%M").to_string(),
                })
            }
            Ok(None) => None,
            Err(e) => {
                warn!(store = store.id(), error = %e, "Dedup lookup failed, using session dedup only");
                None
            }
        }
    }

    async fn post_author(&self, post: &str) -> Result<Option<String>, PageError> {
        Ok(self
            .page
            .query_all(&format!("{} {}", post, AUTHOR_LINK))
            .await?
            .iter()
            .filter_map(|el| el.attr("href"))
            .find_map(username_from_url))
    }

    /// Whether a comment row authored by the own account is visible.
    async fn has_own_comment(&self, post: &str) -> Result<bool, PageError> {
        let own = self.settings.username.to_lowercase();
        let rows = format!("{} {}", post, COMMENT_ROWS);
        let count = self.page.query_all(&rows).await?.len();
        for index in 0..count {
            let links = self.page.query_within(&rows, index, COMMENT_AUTHOR).await?;
            let mine = links.iter().any(|link| {
                let href = link
                    .attr("href")
                    .unwrap_or_default()
                    .trim_matches('/')
                    .to_lowercase();
                href == own && link.text.trim().to_lowercase() == own
            });
            if mine {
                info!(row = index, "Own comment already present");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
