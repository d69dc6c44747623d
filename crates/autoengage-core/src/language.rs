//! Caption language policy.
//!
//! Detection is advisory. Short samples and low-confidence detections are
//! allowed through; only a confident non-English result blocks a candidate.

use std::sync::Arc;

use tracing::debug;

/// Outcome of one detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO 639-3 code.
    pub language: String,
    pub is_english: bool,
    /// In `[0, 1]`.
    pub confidence: f64,
}

pub trait LanguageDetector: Send + Sync {
    /// `None` when the detector cannot decide at all.
    fn detect(&self, text: &str) -> Option<Detection>;
}

/// Trigram-based detector backed by `whatlang`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<Detection> {
        let info = whatlang::detect(text)?;
        Some(Detection {
            language: info.lang().code().to_string(),
            is_english: info.lang() == whatlang::Lang::Eng,
            confidence: info.confidence(),
        })
    }
}

/// Applies the fail-open language rule.
#[derive(Clone)]
pub struct LanguagePolicy {
    detector: Arc<dyn LanguageDetector>,
    confidence_floor: f64,
    min_chars: usize,
}

impl LanguagePolicy {
    pub fn new(detector: Arc<dyn LanguageDetector>, confidence_floor: f64, min_chars: usize) -> Self {
        Self {
            detector,
            confidence_floor,
            min_chars,
        }
    }

    /// Keep letters, digits, whitespace and light punctuation.
    pub fn clean(text: &str) -> String {
        text.chars()
            .filter(|c| {
                c.is_alphanumeric() || c.is_whitespace() || matches!(c, '\'' | '.' | ',' | '!' | '?' | '-')
            })
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Whether `text` may be treated as English. Missing or short text passes.
    pub fn is_acceptable(&self, text: Option<&str>) -> bool {
        let Some(text) = text else {
            return true;
        };
        let cleaned = Self::clean(text);
        if cleaned.chars().count() < self.min_chars {
            return true;
        }

        match self.detector.detect(&cleaned) {
            Some(d) if !d.is_english && d.confidence >= self.confidence_floor => {
                debug!(language = %d.language, confidence = d.confidence, "Non-English text");
                false
            }
            Some(d) => {
                if !d.is_english {
                    debug!(
                        language = %d.language,
                        confidence = d.confidence,
                        "Low-confidence detection, allowing"
                    );
                }
                true
            }
            None => true,
        }
    }
}
