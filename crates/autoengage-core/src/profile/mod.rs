//! Profile classification and inspection.

mod classify;
mod inspector;

pub use classify::{ProfileCategory, ProfileClassifier};
pub use inspector::username_from_url;

use std::path::PathBuf;

/// What the inspector learned about a post's author.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInspectionResult {
    pub approved: bool,
    pub category: Option<ProfileCategory>,
    pub username: Option<String>,
    pub profile_url: Option<String>,
    pub bio: Option<String>,
    pub screenshot: Option<PathBuf>,
}

impl ProfileInspectionResult {
    /// Approved with nothing learned (inspection off, or failed open).
    pub fn pass_through() -> Self {
        Self {
            approved: true,
            category: None,
            username: None,
            profile_url: None,
            bio: None,
            screenshot: None,
        }
    }

    pub fn is_restaurant(&self) -> bool {
        self.category == Some(ProfileCategory::Restaurant)
    }
}
