//! # AutoEngage Core
//!
//! The session interaction engine. A [`Session`] owns one primary page and
//! drives it through campaigns (post candidates), story walks and DM cycles:
//!
//! - [`target`] resolves a requested target into a closed [`Target`] variant
//! - [`navigator`] puts the page on the right surface
//! - [`campaign`] iterates candidates up to a bound
//! - [`filters`] decides pass or skip for each candidate
//! - [`executor`] likes, generates, types and submits
//! - [`dm`] handles outreach, inbox replies and plain direct messages
//! - [`stories`] walks the story viewer
//!
//! All delays go through [`timing::HumanPacer`]; all page access goes through
//! the [`autoengage_protocols::Page`] trait.

pub mod audit;
pub mod campaign;
pub mod caption;
pub mod dm;
pub mod error;
pub mod executor;
pub mod filters;
pub mod followers;
pub mod gate;
pub mod language;
pub mod locator;
pub mod location;
pub mod metrics;
pub mod navigator;
pub mod options;
pub mod popups;
pub mod profile;
pub mod prompts;
pub mod session;
pub mod stories;
pub mod target;
pub mod timing;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use campaign::{CampaignReport, StopReason};
pub use dm::{DirectSend, InboxReport, OutreachOutcome};
pub use error::EngineError;
pub use gate::{RunGate, RunPermit};
pub use options::{EngagementThresholds, InteractionOptions, StoryOptions};
pub use session::{LoginMethod, Session, SessionBuilder, SessionSettings};
pub use stories::StoryReport;
pub use target::{InteractionMode, Target};

/// Origin of the social surface.
pub const BASE_URL: &str = "https://www.instagram.com";

/// Absolute URL for a site-relative path.
pub fn site_url(path: &str) -> String {
    format!("{}/{}", BASE_URL, path.trim_start_matches('/'))
}
