//! Engagement counters scraped from post text.

use std::sync::LazyLock;

use regex::Regex;

static LIKES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d][\d.,]*\s*[km]?)\s+likes?\b").expect("static regex")
});

static COMMENTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:view\s+all\s+)?([\d][\d.,]*\s*[km]?)\s+comments?\b")
        .expect("static regex")
});

/// Parse a displayed count such as `1,234`, `12.5k` or `3M`.
pub fn parse_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let lower = cleaned.to_lowercase();

    let (number, multiplier) = if let Some(n) = lower.strip_suffix('k') {
        (n, 1_000.0)
    } else if let Some(n) = lower.strip_suffix('m') {
        (n, 1_000_000.0)
    } else {
        (lower.as_str(), 1.0)
    };

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

/// Like and comment counts for a candidate. `None` when not shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementMetrics {
    pub likes: Option<u64>,
    pub comments: Option<u64>,
}

impl EngagementMetrics {
    pub fn new(likes: Option<u64>, comments: Option<u64>) -> Self {
        Self { likes, comments }
    }

    /// Extract counts from a post container's rendered text.
    pub fn from_text(text: &str) -> Self {
        let likes = LIKES_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| parse_count(m.as_str()));
        let comments = COMMENTS_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| parse_count(m.as_str()));
        Self { likes, comments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42"), Some(42));
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count("12.5k"), Some(12_500));
        assert_eq!(parse_count("3M"), Some(3_000_000));
        assert_eq!(parse_count(" 2 K "), Some(2_000));
        assert_eq!(parse_count("abc"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn test_from_text() {
        let m = EngagementMetrics::from_text("chef.anna\n1,024 likes\nView all 37 comments\n2 days ago");
        assert_eq!(m, EngagementMetrics::new(Some(1024), Some(37)));
    }

    #[test]
    fn test_from_text_suffix_and_singular() {
        let m = EngagementMetrics::from_text("12.3K likes · 1 comment");
        assert_eq!(m.likes, Some(12_300));
        assert_eq!(m.comments, Some(1));
    }

    #[test]
    fn test_from_text_missing() {
        let m = EngagementMetrics::from_text("Liked by others");
        assert_eq!(m, EngagementMetrics::default());
    }
}
