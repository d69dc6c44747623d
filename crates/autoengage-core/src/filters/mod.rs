//! Candidate filtering.
//!
//! [`pipeline`] runs the ordered checks for one candidate; [`thresholds`]
//! owns the adaptive engagement minimums across a campaign.

pub mod pipeline;
pub mod thresholds;

pub use pipeline::{Candidate, Evaluation, SkipReason, Verdict};
pub use thresholds::ThresholdGovernor;
