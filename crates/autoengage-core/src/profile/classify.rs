use std::fmt;

use serde::{Deserialize, Serialize};

use autoengage_config::KeywordsConfig;

/// Business category of a profile, derived from its header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileCategory {
    Restaurant,
    Foodie,
    Other,
}

impl ProfileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Foodie => "foodie",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ProfileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword-membership classifier. Restaurant wins over foodie.
#[derive(Debug, Clone)]
pub struct ProfileClassifier {
    restaurant: Vec<String>,
    foodie: Vec<String>,
}

impl ProfileClassifier {
    pub fn new(restaurant: &[String], foodie: &[String]) -> Self {
        let lower = |list: &[String]| {
            list.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            restaurant: lower(restaurant),
            foodie: lower(foodie),
        }
    }

    pub fn from_keywords(keywords: &KeywordsConfig) -> Self {
        Self::new(&keywords.restaurant, &keywords.foodie)
    }

    pub fn classify(&self, text: &str) -> ProfileCategory {
        let text = text.to_lowercase();
        if self.restaurant.iter().any(|k| text.contains(k.as_str())) {
            ProfileCategory::Restaurant
        } else if self.foodie.iter().any(|k| text.contains(k.as_str())) {
            ProfileCategory::Foodie
        } else {
            ProfileCategory::Other
        }
    }

    /// True when `required` is empty or `text` mentions any of it.
    pub fn meets_requirements(text: &str, required: &[String]) -> bool {
        let text = text.to_lowercase();
        let mut wanted = required
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .peekable();
        if wanted.peek().is_none() {
            return true;
        }
        wanted.any(|k| text.contains(&k))
    }

    /// Lead approval: a restaurant profile that satisfies the bio requirement.
    pub fn approves(&self, category: ProfileCategory, text: &str, required: &[String]) -> bool {
        category == ProfileCategory::Restaurant && Self::meets_requirements(text, required)
    }
}

impl Default for ProfileClassifier {
    fn default() -> Self {
        Self::from_keywords(&KeywordsConfig::default())
    }
}
