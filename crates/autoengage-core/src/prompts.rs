//! Prompt templates for comments, lead DMs and inbox replies.

use autoengage_config::{CtaStyle, EmojiLevel, OutreachConfig};

/// Prompt for a post comment.
pub fn comment_prompt(caption: &str, is_video: bool, video_url: Option<&str>) -> String {
    let kind = if is_video { "VIDEO/REEL" } else { "IMAGE" };
    let video_info = match video_url {
        Some(url) if is_video => format!("\n[VIDEO POST - URL: {}]", url),
        _ => String::new(),
    };
    let visual_context = if is_video {
        "This is a video post. Use the thumbnail and caption to infer what happens in the \
         video: the action, the mood, the food or place shown. React to the moment, not just \
         the caption."
    } else {
        "This is an image post. Look at the attached image: describe in your own words a \
         concrete detail you notice (colours, plating, setting, expression) and react to it."
    };
    let seen = if is_video { "watched the video" } else { "saw the image" };

    format!(
        "Generate a human-like Instagram comment for this {kind} post.\n\
         Caption: \"{caption}\"{video_info}\n\n\
         {visual_context}\n\n\
         CRITICAL REQUIREMENTS:\n\
         - MUST be in ENGLISH ONLY (no other languages, even if the caption is not in English)\n\
         - Keep it concise (1-2 sentences max)\n\
         - Be genuine and specific, avoid generic praise\n\n\
         Create a comment that feels like it came from a real person who {seen}.\n\
         IMPORTANT: Write in clear, proper English only. Do not mix languages."
    )
}

fn persona_rules(outreach: &OutreachConfig) -> String {
    let cta = match outreach.cta_style {
        CtaStyle::Soft => "End with a soft, low-pressure invitation to keep talking",
        CtaStyle::Direct => "End with a direct call to action (book a call)",
        CtaStyle::Question => "End with a short question that invites a reply",
        CtaStyle::None => "Do not add a call to action",
    };
    let emoji = match outreach.emoji_level {
        EmojiLevel::None => "Do not use emojis",
        EmojiLevel::Low => "Use at most one emoji",
        EmojiLevel::Medium => "Light emoji use is fine",
    };

    let mut rules = vec![
        format!("- Tone: {}", outreach.tone.as_str()),
        format!(
            "- At most {} sentences and {} characters",
            outreach.max_sentences, outreach.max_chars
        ),
        format!("- {}", cta),
        format!("- {}", emoji),
    ];
    if !outreach.avoid_topics.is_empty() {
        rules.push(format!("- Never discuss: {}", outreach.avoid_topics.join(", ")));
    }
    if !outreach.signature.trim().is_empty() {
        rules.push(format!("- Sign off with: {}", outreach.signature.trim()));
    }
    rules.join("\n")
}

fn or_not_provided(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("Not provided")
}

/// Prompt for a first-contact lead DM.
pub fn lead_prompt(
    outreach: &OutreachConfig,
    username: &str,
    bio: Option<&str>,
    caption: Option<&str>,
) -> String {
    format!(
        "You are a marketing strategist from {brand}. {value} Write a short Instagram DM to @{username}.\n\n\
         About us: {about}\n\
         Offer: {offer}\n\n\
         Prospect bio: {bio}\n\
         Recent caption: {caption}\n\n\
         Requirements:\n\
         - Friendly, confident and human\n\
         - Reference something relevant from their bio/caption if possible\n\
         - Mention that we deliver done-for-you marketing with guaranteed results and no long-term contracts\n\
         {persona}\n\n\
         Return only the DM text.",
        brand = outreach.brand_name,
        value = outreach.value_proposition.trim(),
        about = outreach.about.trim(),
        offer = outreach.offer.trim(),
        bio = or_not_provided(bio),
        caption = or_not_provided(caption),
        persona = persona_rules(outreach),
    )
}

/// Prompt for an inbox reply given the recent visible messages.
pub fn reply_prompt(outreach: &OutreachConfig, history: &[String]) -> String {
    format!(
        "You received an Instagram DM conversation on behalf of {brand}. \
         Recent messages: \"{history}\".\n\
         Generate a friendly, helpful reply that:\n\
         - Answers any questions they asked\n\
         - Is conversational and natural\n\
         - Matches their tone and energy\n\
         - Sounds like a real person, not a bot\n\
         - Is relevant to what they said\n\
         {persona}",
        brand = outreach.brand_name,
        history = history.join(" | "),
        persona = persona_rules(outreach),
    )
}

/// Schema for free-text replies: an object with a single `message` field.
pub fn message_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "message": {"type": "string"}
        },
        "required": ["message"]
    })
}

/// Pull the message text out of a generation result.
pub fn message_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s.as_str(),
        serde_json::Value::Object(map) => map.get("message")?.as_str()?,
        serde_json::Value::Array(items) => return items.first().and_then(message_text),
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_prompt_image() {
        let p = comment_prompt("Sunday brunch", false, None);
        assert!(p.contains("for this IMAGE post"));
        assert!(p.contains("Caption: \"Sunday brunch\""));
        assert!(p.contains("saw the image"));
        assert!(!p.contains("VIDEO POST"));
    }

    #[test]
    fn test_comment_prompt_video_url() {
        let p = comment_prompt("Reel", true, Some("https://cdn.example/v.mp4"));
        assert!(p.contains("VIDEO/REEL"));
        assert!(p.contains("[VIDEO POST - URL: https://cdn.example/v.mp4]"));
        assert!(p.contains("watched the video"));
    }

    #[test]
    fn test_lead_prompt_fills_missing() {
        let outreach = OutreachConfig::default();
        let p = lead_prompt(&outreach, "luigis", None, Some("  "));
        assert!(p.contains("DM to @luigis"));
        assert!(p.contains("Prospect bio: Not provided"));
        assert!(p.contains("Recent caption: Not provided"));
        assert!(p.contains(&outreach.brand_name));
        assert!(p.contains("Never discuss: prices"));
    }

    #[test]
    fn test_reply_prompt_joins_history() {
        let mut outreach = OutreachConfig::default();
        outreach.signature = "- Sam".to_string();
        let p = reply_prompt(&outreach, &["hi".to_string(), "how much?".to_string()]);
        assert!(p.contains("\"hi | how much?\""));
        assert!(p.contains("Sign off with: - Sam"));
        assert!(p.contains("Tone: friendly"));
    }

    #[test]
    fn test_message_text_shapes() {
        assert_eq!(message_text(&json!({"message": " Hey! "})), Some("Hey!".to_string()));
        assert_eq!(message_text(&json!("plain")), Some("plain".to_string()));
        assert_eq!(message_text(&json!([{"message": "first"}])), Some("first".to_string()));
        assert_eq!(message_text(&json!({"message": ""})), None);
        assert_eq!(message_text(&json!(3)), None);
    }
}
