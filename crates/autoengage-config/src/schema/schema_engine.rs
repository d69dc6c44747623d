//! Engine tuning and keyword configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the interaction engine.
///
/// None of these have a derivation beyond "worked in practice"; they are
/// exposed so tests and operators can move them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Non-English detections below this confidence are ignored.
    #[serde(default = "default_language_confidence_floor")]
    pub language_confidence_floor: f64,

    /// Cleaned texts shorter than this are not language-checked.
    #[serde(default = "default_language_min_chars")]
    pub language_min_chars: usize,

    #[serde(default = "default_relaxation_factor")]
    pub relaxation_factor: f64,

    #[serde(default = "default_max_relaxations")]
    pub max_relaxations: u32,

    /// Consecutive threshold skips that trigger a relaxation.
    #[serde(default = "default_relax_after_skips")]
    pub relax_after_skips: u32,

    #[serde(default = "default_likes_floor")]
    pub likes_floor: u64,

    #[serde(default = "default_comments_floor")]
    pub comments_floor: u64,

    /// Probability of not liking a post that is commented on.
    #[serde(default = "default_like_skip_probability")]
    pub like_skip_probability: f64,

    /// Audit screenshot every N-th candidate.
    #[serde(default = "default_screenshot_every")]
    pub screenshot_every: usize,

    #[serde(default = "default_max_outbound_dms")]
    pub max_outbound_dms: u32,

    #[serde(default = "default_post_pause_min_ms")]
    pub post_pause_min_ms: u64,

    #[serde(default = "default_post_pause_max_ms")]
    pub post_pause_max_ms: u64,

    /// Inject a status pill into the page for headed runs.
    #[serde(default)]
    pub show_overlay: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language_confidence_floor: default_language_confidence_floor(),
            language_min_chars: default_language_min_chars(),
            relaxation_factor: default_relaxation_factor(),
            max_relaxations: default_max_relaxations(),
            relax_after_skips: default_relax_after_skips(),
            likes_floor: default_likes_floor(),
            comments_floor: default_comments_floor(),
            like_skip_probability: default_like_skip_probability(),
            screenshot_every: default_screenshot_every(),
            max_outbound_dms: default_max_outbound_dms(),
            post_pause_min_ms: default_post_pause_min_ms(),
            post_pause_max_ms: default_post_pause_max_ms(),
            show_overlay: false,
        }
    }
}

fn default_language_confidence_floor() -> f64 {
    0.35
}

fn default_language_min_chars() -> usize {
    8
}

fn default_relaxation_factor() -> f64 {
    0.8
}

fn default_max_relaxations() -> u32 {
    3
}

fn default_relax_after_skips() -> u32 {
    3
}

fn default_likes_floor() -> u64 {
    5
}

fn default_comments_floor() -> u64 {
    1
}

fn default_like_skip_probability() -> f64 {
    0.2
}

fn default_screenshot_every() -> usize {
    3
}

fn default_max_outbound_dms() -> u32 {
    10
}

fn default_post_pause_min_ms() -> u64 {
    10_000
}

fn default_post_pause_max_ms() -> u64 {
    25_000
}

/// Keyword sets used to classify profile bios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default = "default_restaurant_keywords")]
    pub restaurant: Vec<String>,

    #[serde(default = "default_foodie_keywords")]
    pub foodie: Vec<String>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            restaurant: default_restaurant_keywords(),
            foodie: default_foodie_keywords(),
        }
    }
}

fn default_restaurant_keywords() -> Vec<String> {
    [
        "restaurant",
        "cafe",
        "bistro",
        "kitchen",
        "chef",
        "barbecue",
        "bbq",
        "food",
        "dining",
        "eatery",
        "grill",
        "steakhouse",
        "pizzeria",
        "bakery",
        "catering",
        "drink",
        "coffee",
        "brunch",
        "sushi",
        "tapas",
        "mexican",
        "italian",
        "thai",
        "indian",
        "seafood",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_foodie_keywords() -> Vec<String> {
    [
        "foodie",
        "food lover",
        "food blog",
        "food blogger",
        "recipes",
        "home cook",
        "food content",
        "food photography",
        "food review",
        "food critic",
        "food memes",
        "chef mode",
        "food adventures",
        "eater",
        "yummy",
        "delish",
        "taste tester",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
