//! Engagement thresholds with bounded adaptive relaxation.

use tracing::info;

use autoengage_config::EngineConfig;

use super::SkipReason;
use crate::metrics::EngagementMetrics;
use crate::options::EngagementThresholds;

/// Owns the live thresholds for one campaign.
///
/// After `relax_after` consecutive threshold skips every configured minimum
/// is multiplied by the relaxation factor and floored; a minimum that would
/// fall below its floor is removed. Relaxation happens at most
/// `max_relaxations` times and never raises a minimum.
#[derive(Debug, Clone)]
pub struct ThresholdGovernor {
    current: EngagementThresholds,
    factor: f64,
    likes_floor: u64,
    comments_floor: u64,
    max_relaxations: u32,
    relax_after: u32,
    consecutive: u32,
    relaxations: u32,
}

impl ThresholdGovernor {
    pub fn new(initial: EngagementThresholds, engine: &EngineConfig) -> Self {
        Self {
            current: initial,
            factor: engine.relaxation_factor.clamp(0.0, 1.0),
            likes_floor: engine.likes_floor,
            comments_floor: engine.comments_floor,
            max_relaxations: engine.max_relaxations,
            relax_after: engine.relax_after_skips.max(1),
            consecutive: 0,
            relaxations: 0,
        }
    }

    pub fn current(&self) -> EngagementThresholds {
        self.current
    }

    pub fn relaxations(&self) -> u32 {
        self.relaxations
    }

    /// Check metrics against the live thresholds. Unknown counts fail.
    pub fn check(&self, metrics: &EngagementMetrics) -> Option<SkipReason> {
        if let Some(min) = self.current.min_likes.filter(|m| *m > 0) {
            if metrics.likes.is_none_or(|likes| likes < min) {
                return Some(SkipReason::LikesBelow {
                    actual: metrics.likes,
                    min,
                });
            }
        }
        if let Some(min) = self.current.min_comments.filter(|m| *m > 0) {
            if metrics.comments.is_none_or(|comments| comments < min) {
                return Some(SkipReason::CommentsBelow {
                    actual: metrics.comments,
                    min,
                });
            }
        }
        None
    }

    /// Note a threshold skip. Returns true when it triggered a relaxation.
    pub fn record_threshold_skip(&mut self) -> bool {
        self.consecutive += 1;
        if self.consecutive < self.relax_after || self.relaxations >= self.max_relaxations {
            return false;
        }

        let before = self.current;
        self.current.min_likes = relax(self.current.min_likes, self.factor, self.likes_floor);
        self.current.min_comments =
            relax(self.current.min_comments, self.factor, self.comments_floor);
        if self.current == before {
            return false;
        }

        self.relaxations += 1;
        self.consecutive = 0;
        info!(
            min_likes = ?self.current.min_likes,
            min_comments = ?self.current.min_comments,
            relaxation = self.relaxations,
            "Relaxed engagement thresholds"
        );
        true
    }

    /// Any outcome other than a threshold skip breaks the streak.
    pub fn record_other(&mut self) {
        self.consecutive = 0;
    }
}

fn relax(value: Option<u64>, factor: f64, floor: u64) -> Option<u64> {
    let value = value?;
    let next = (value as f64 * factor).floor() as u64;
    if next < floor { None } else { Some(next.min(value)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(likes: Option<u64>, comments: Option<u64>) -> ThresholdGovernor {
        ThresholdGovernor::new(
            EngagementThresholds {
                min_likes: likes,
                min_comments: comments,
            },
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_undefined_thresholds_pass() {
        let g = governor(None, None);
        assert_eq!(g.check(&EngagementMetrics::default()), None);
    }

    #[test]
    fn test_unknown_metric_fails() {
        let g = governor(Some(10), None);
        let reason = g.check(&EngagementMetrics::default()).unwrap();
        assert_eq!(reason.to_string(), "likes unknown < 10");
    }

    #[test]
    fn test_comments_checked_after_likes() {
        let g = governor(Some(10), Some(5));
        let reason = g.check(&EngagementMetrics::new(Some(20), Some(2))).unwrap();
        assert_eq!(reason.to_string(), "comments 2 < 5");
        assert!(g.check(&EngagementMetrics::new(Some(20), Some(5))).is_none());
    }

    #[test]
    fn test_relaxes_after_three_consecutive() {
        let mut g = governor(Some(1000), None);
        assert!(!g.record_threshold_skip());
        assert!(!g.record_threshold_skip());
        assert!(g.record_threshold_skip());
        assert_eq!(g.current().min_likes, Some(800));
        assert!(g.check(&EngagementMetrics::new(Some(850), None)).is_none());
    }

    #[test]
    fn test_streak_reset_by_other_outcome() {
        let mut g = governor(Some(1000), None);
        g.record_threshold_skip();
        g.record_threshold_skip();
        g.record_other();
        assert!(!g.record_threshold_skip());
        assert_eq!(g.current().min_likes, Some(1000));
    }

    #[test]
    fn test_floor_removes_threshold() {
        let mut g = governor(Some(6), Some(1));
        for _ in 0..3 {
            g.record_threshold_skip();
        }
        assert_eq!(g.current().min_likes, None);
        assert_eq!(g.current().min_comments, None);
    }

    #[test]
    fn test_relaxation_bounded_and_monotonic() {
        let mut g = governor(Some(100_000), Some(500));
        let mut previous = g.current();
        for _ in 0..50 {
            g.record_threshold_skip();
            let now = g.current();
            assert!(now.min_likes <= previous.min_likes);
            assert!(now.min_comments <= previous.min_comments);
            if let Some(likes) = now.min_likes {
                assert!(likes >= 5);
            }
            previous = now;
        }
        assert_eq!(g.relaxations(), 3);
        assert_eq!(g.current().min_likes, Some(51_200));
    }
}
