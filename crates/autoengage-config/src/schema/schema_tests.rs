use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(config.account.username.is_empty());
    assert!(config.account.password.is_none());
    assert_eq!(config.browser.debug_port, 9222);
    assert!(config.store.enabled);
    assert_eq!(config.generator.provider, "gemini");
}

#[test]
fn test_engine_config_default() {
    let engine = EngineConfig::default();
    assert_eq!(engine.language_confidence_floor, 0.35);
    assert_eq!(engine.language_min_chars, 8);
    assert_eq!(engine.relaxation_factor, 0.8);
    assert_eq!(engine.max_relaxations, 3);
    assert_eq!(engine.relax_after_skips, 3);
    assert_eq!(engine.likes_floor, 5);
    assert_eq!(engine.comments_floor, 1);
    assert_eq!(engine.like_skip_probability, 0.2);
    assert_eq!(engine.screenshot_every, 3);
    assert_eq!(engine.max_outbound_dms, 10);
    assert!(!engine.show_overlay);
}

#[test]
fn test_keywords_default_disjoint() {
    let keywords = KeywordsConfig::default();
    assert!(keywords.restaurant.contains(&"restaurant".to_string()));
    assert!(keywords.foodie.contains(&"foodie".to_string()));
    for k in &keywords.restaurant {
        assert!(!keywords.foodie.contains(k), "{k} in both lists");
    }
}

#[test]
fn test_outreach_default() {
    let outreach = OutreachConfig::default();
    assert!(outreach.value_proposition.contains("Marketing Team App"));
    assert_eq!(outreach.tone, ReplyTone::Friendly);
    assert_eq!(outreach.cta_style, CtaStyle::Question);
    assert_eq!(outreach.emoji_level, EmojiLevel::Low);
    assert_eq!(outreach.max_sentences, 2);
    assert_eq!(outreach.max_chars, 260);
}

#[test]
fn test_outreach_normalize() {
    let mut outreach = OutreachConfig {
        max_sentences: 0,
        max_chars: 10_000,
        brand_name: "  ".to_string(),
        signature: "x".repeat(500),
        avoid_topics: vec![" politics ".to_string(), "".to_string()],
        ..Default::default()
    };
    outreach.normalize();
    assert_eq!(outreach.max_sentences, 1);
    assert_eq!(outreach.max_chars, 600);
    assert_eq!(outreach.brand_name, "Marketing Team App");
    assert_eq!(outreach.signature.chars().count(), 120);
    assert_eq!(outreach.avoid_topics, vec!["politics".to_string()]);
}

#[test]
fn test_tone_deserialize() {
    let outreach: OutreachConfig = toml::from_str("tone = \"hype\"\ncta_style = \"none\"").unwrap();
    assert_eq!(outreach.tone, ReplyTone::Hype);
    assert_eq!(outreach.tone.as_str(), "hype");
    assert_eq!(outreach.cta_style, CtaStyle::None);
}

#[test]
fn test_secrets_not_serialized() {
    let mut config = Config::default();
    config.account.password = Some("hunter2".to_string());
    config.generator.api_key = Some("key-123".to_string());
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("hunter2"));
    assert!(!json.contains("key-123"));
}
