//! Outreach and DM persona configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyTone {
    #[default]
    Friendly,
    Professional,
    Consultative,
    Playful,
    Hype,
}

impl ReplyTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyTone::Friendly => "friendly",
            ReplyTone::Professional => "professional",
            ReplyTone::Consultative => "consultative",
            ReplyTone::Playful => "playful",
            ReplyTone::Hype => "hype",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtaStyle {
    Soft,
    Direct,
    #[default]
    Question,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiLevel {
    None,
    #[default]
    Low,
    Medium,
}

/// Lead-generation pitch and DM reply persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachConfig {
    #[serde(default = "default_value_proposition")]
    pub value_proposition: String,

    /// Sent when generation fails or returns nothing.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    #[serde(default = "default_reply_fallback")]
    pub reply_fallback: String,

    #[serde(default = "default_brand_name")]
    pub brand_name: String,

    #[serde(default = "default_about")]
    pub about: String,

    #[serde(default = "default_offer")]
    pub offer: String,

    #[serde(default)]
    pub tone: ReplyTone,

    #[serde(default)]
    pub cta_style: CtaStyle,

    #[serde(default)]
    pub emoji_level: EmojiLevel,

    #[serde(default = "default_max_sentences")]
    pub max_sentences: u32,

    #[serde(default = "default_max_chars")]
    pub max_chars: u32,

    #[serde(default)]
    pub signature: String,

    #[serde(default = "default_avoid_topics")]
    pub avoid_topics: Vec<String>,
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            value_proposition: default_value_proposition(),
            fallback_message: default_fallback_message(),
            reply_fallback: default_reply_fallback(),
            brand_name: default_brand_name(),
            about: default_about(),
            offer: default_offer(),
            tone: ReplyTone::default(),
            cta_style: CtaStyle::default(),
            emoji_level: EmojiLevel::default(),
            max_sentences: default_max_sentences(),
            max_chars: default_max_chars(),
            signature: String::new(),
            avoid_topics: default_avoid_topics(),
        }
    }
}

impl OutreachConfig {
    /// Clamp numeric limits and trim free-text fields to their caps.
    pub fn normalize(&mut self) {
        self.max_sentences = self.max_sentences.clamp(1, 4);
        self.max_chars = self.max_chars.clamp(80, 600);
        if self.brand_name.trim().is_empty() {
            self.brand_name = default_brand_name();
        }
        self.brand_name = truncate_chars(&self.brand_name, 60);
        self.about = truncate_chars(&self.about, 2000);
        self.offer = truncate_chars(&self.offer, 2000);
        self.signature = truncate_chars(&self.signature, 120);
        self.avoid_topics = self
            .avoid_topics
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(50)
            .collect();
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn default_value_proposition() -> String {
    "Marketing Team App is your remote digital marketing team. We deliver full-funnel strategy, \
     daily content production, paid ads, AI automation, and a 30-day money-back guarantee with \
     no long-term contracts. Packages start at $249/mo and average 310% ROI for 500+ clients."
        .to_string()
}

fn default_fallback_message() -> String {
    "Hey! We help restaurants with full-service marketing that guarantees results. \
     Want me to send our plan? 😊"
        .to_string()
}

fn default_reply_fallback() -> String {
    "Thanks for reaching out! 😊".to_string()
}

fn default_brand_name() -> String {
    "Marketing Team App".to_string()
}

fn default_about() -> String {
    "We help businesses with marketing and growth.".to_string()
}

fn default_offer() -> String {
    "We offer marketing services and automation to generate leads.".to_string()
}

fn default_max_sentences() -> u32 {
    2
}

fn default_max_chars() -> u32 {
    260
}

fn default_avoid_topics() -> Vec<String> {
    vec![
        "prices".to_string(),
        "sensitive personal data".to_string(),
        "illegal activity".to_string(),
    ]
}
