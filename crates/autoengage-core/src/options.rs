//! Per-invocation options.
//!
//! Every field is optional on the wire; missing fields fall back to
//! permissive or no-op behaviour.

use serde::{Deserialize, Serialize};

use crate::target::InteractionMode;

/// Candidate bound used when a caller does not supply one.
pub const DEFAULT_MAX_POSTS: usize = 15;

/// Minimum engagement a post must show. `None` disables that dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementThresholds {
    pub min_likes: Option<u64>,
    pub min_comments: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionOptions {
    /// Explicit mode. Inferred from the target string when absent.
    pub mode: Option<InteractionMode>,

    /// Candidate hashtags; one is picked at random.
    pub hashtags: Vec<String>,

    /// Pre-resolved location path (`<id>/<slug>/`).
    pub location_path: Option<String>,

    /// Free-text place to resolve.
    pub location_query: Option<String>,

    pub location_coordinates: Option<Coordinates>,

    pub competitor_username: Option<String>,
    pub followers_to_engage: Option<usize>,
    pub posts_per_follower: Option<usize>,

    pub engagement: EngagementThresholds,

    pub english_only: bool,
    pub images_only: bool,
    pub require_caption: bool,
    pub inspect_profile: bool,
    pub send_dms: bool,
    pub max_outbound_dms: Option<u32>,

    /// Bio keywords a lead profile must mention (any one). Empty means no requirement.
    pub required_bio_keywords: Vec<String>,

    /// Used when the resolved mode is stories.
    pub stories: StoryOptions,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            mode: None,
            hashtags: Vec::new(),
            location_path: None,
            location_query: None,
            location_coordinates: None,
            competitor_username: None,
            followers_to_engage: None,
            posts_per_follower: None,
            engagement: EngagementThresholds::default(),
            english_only: true,
            images_only: true,
            require_caption: true,
            inspect_profile: false,
            send_dms: false,
            max_outbound_dms: None,
            required_bio_keywords: Vec::new(),
            stories: StoryOptions::default(),
        }
    }
}

impl InteractionOptions {
    /// Lead DM cap for this run, falling back to the configured default.
    pub fn outbound_dm_cap(&self, configured: u32) -> u32 {
        self.max_outbound_dms.unwrap_or(configured)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryOptions {
    pub count: Option<usize>,
    pub min_watch_ms: Option<u64>,
    pub max_watch_ms: Option<u64>,
    pub like_probability: Option<f64>,
    pub reaction_probability: Option<f64>,
    pub reaction_text: Option<String>,
}

/// [`StoryOptions`] with every value defaulted and clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryPlan {
    pub count: usize,
    pub min_watch_ms: u64,
    pub max_watch_ms: u64,
    pub like_probability: f64,
    pub reaction_probability: f64,
    pub reaction_text: String,
}

impl StoryPlan {
    pub const DEFAULT_COUNT: usize = 10;
    pub const DEFAULT_REACTION: &'static str = "🔥";

    pub fn from_options(options: &StoryOptions) -> Self {
        let count = options.count.unwrap_or(Self::DEFAULT_COUNT).max(1);

        let mut min = options.min_watch_ms.unwrap_or(5_000);
        let mut max = options.max_watch_ms.unwrap_or(9_000);
        if max < min {
            std::mem::swap(&mut min, &mut max);
        }
        let min = min.max(2_000);
        let max = max.max(min + 500);

        let reaction_text = options
            .reaction_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(Self::DEFAULT_REACTION)
            .to_string();

        Self {
            count,
            min_watch_ms: min,
            max_watch_ms: max,
            like_probability: probability(options.like_probability, 0.25),
            reaction_probability: probability(options.reaction_probability, 0.2),
            reaction_text,
        }
    }
}

fn probability(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(p) if p.is_finite() => p.clamp(0.0, 1.0),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_defaults() {
        let opts = InteractionOptions::default();
        assert!(opts.english_only);
        assert!(opts.images_only);
        assert!(opts.require_caption);
        assert!(!opts.inspect_profile);
        assert!(!opts.send_dms);
        assert_eq!(opts.outbound_dm_cap(10), 10);
        let capped = InteractionOptions {
            max_outbound_dms: Some(2),
            ..Default::default()
        };
        assert_eq!(capped.outbound_dm_cap(10), 2);
        assert_eq!(opts.engagement, EngagementThresholds::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let opts: InteractionOptions = serde_json::from_str(
            r#"{"mode":"hashtag","hashtags":["food"],"engagement":{"min_likes":100},"images_only":false}"#,
        )
        .unwrap();
        assert_eq!(opts.mode, Some(InteractionMode::Hashtag));
        assert_eq!(opts.engagement.min_likes, Some(100));
        assert_eq!(opts.engagement.min_comments, None);
        assert!(!opts.images_only);
        assert!(opts.english_only);
    }

    #[test]
    fn test_story_plan_defaults() {
        let plan = StoryPlan::from_options(&StoryOptions::default());
        assert_eq!(plan.count, 10);
        assert_eq!(plan.min_watch_ms, 5_000);
        assert_eq!(plan.max_watch_ms, 9_000);
        assert_eq!(plan.like_probability, 0.25);
        assert_eq!(plan.reaction_probability, 0.2);
        assert_eq!(plan.reaction_text, "🔥");
    }

    #[test]
    fn test_story_plan_clamps() {
        let plan = StoryPlan::from_options(&StoryOptions {
            count: Some(0),
            min_watch_ms: Some(1_800),
            max_watch_ms: Some(500),
            like_probability: Some(3.0),
            reaction_probability: Some(-1.0),
            reaction_text: Some("   ".to_string()),
        });
        assert_eq!(plan.count, 1);
        assert_eq!(plan.min_watch_ms, 2_000);
        assert_eq!(plan.max_watch_ms, 2_500);
        assert_eq!(plan.like_probability, 1.0);
        assert_eq!(plan.reaction_probability, 0.0);
        assert_eq!(plan.reaction_text, "🔥");
    }

    #[test]
    fn test_story_plan_nan_probability_defaults() {
        let plan = StoryPlan::from_options(&StoryOptions {
            like_probability: Some(f64::NAN),
            ..Default::default()
        });
        assert_eq!(plan.like_probability, 0.25);
    }
}
